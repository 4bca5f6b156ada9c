/// スナップショットAPIの抽象化
///
/// 検索クラスタのスナップショット管理APIを抽象化し、
/// 異なる実装を可能にする（OpenSearch Service実装、テスト用モック）。
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::SnapshotInfo;

/// クラスタ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// リクエスト送信に失敗（ネットワーク、タイムアウト、署名など）
    #[error("クラスタへのリクエストに失敗: {0}")]
    RequestFailed(String),

    /// クラスタがエラーレスポンスを返した
    #[error("クラスタがエラーを返しました: status={status}, body={body}")]
    ErrorResponse {
        /// HTTPステータスコード
        status: u16,
        /// レスポンスボディ
        body: String,
    },

    /// レスポンスの解析に失敗
    #[error("レスポンスの解析に失敗: {0}")]
    InvalidResponse(String),
}

impl ClusterError {
    /// 他のスナップショット処理と競合して拒否されたか
    ///
    /// クラスタは競合時に503と`concurrent_snapshot_execution_exception`を返す。
    pub fn is_concurrent_snapshot(&self) -> bool {
        match self {
            ClusterError::ErrorResponse { status, body } => {
                *status == 503 || body.contains("concurrent_snapshot_execution_exception")
            }
            _ => false,
        }
    }
}

/// スナップショット管理API
#[async_trait]
pub trait SnapshotCluster: Send + Sync {
    /// リポジトリ内の全スナップショットを取得
    async fn list_snapshots(&self, repository: &str) -> Result<Vec<SnapshotInfo>, ClusterError>;

    /// クラスタ全体で実行中のスナップショット名を取得
    async fn running_snapshots(&self) -> Result<Vec<String>, ClusterError>;

    /// スナップショットを1件削除
    async fn delete_snapshot(&self, repository: &str, snapshot: &str) -> Result<(), ClusterError>;

    /// クラスタ内の全インデックス名を取得
    async fn list_indices(&self) -> Result<Vec<String>, ClusterError>;

    /// リポジトリが全ノードから書き込み可能か検証する
    async fn verify_repository(&self, repository: &str) -> Result<(), ClusterError>;

    /// スナップショットの作成を開始する（完了は待たない）
    async fn create_snapshot(
        &self,
        repository: &str,
        snapshot: &str,
        indices: &[String],
    ) -> Result<(), ClusterError>;

    /// スナップショット1件の現在の情報（状態を含む）を取得
    async fn get_snapshot(
        &self,
        repository: &str,
        snapshot: &str,
    ) -> Result<SnapshotInfo, ClusterError>;
}
