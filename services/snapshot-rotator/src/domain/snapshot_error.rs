/// スナップショット操作の想定内エラー
///
/// 削除フェーズ・取得フェーズで発生しうる失敗を4種類に分類する。
/// いずれもフェーズ内でログに記録され、実行全体を中断しない。
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotActionError {
    /// プレフィックスに一致するスナップショットがない（info）
    #[error("プレフィックスに一致するスナップショットがありません: {prefix}")]
    NoSnapshots { prefix: String },

    /// プレフィックスに一致するインデックスがない（warning）
    #[error("プレフィックスに一致するインデックスがありません: {prefix}")]
    NoIndices { prefix: String },

    /// 他のスナップショット処理が実行中
    #[error("スナップショット処理が実行中です: {0}")]
    SnapshotInProgress(String),

    /// クラスタ側で操作が失敗した
    #[error("スナップショット操作に失敗: {0}")]
    FailedExecution(String),
}

impl SnapshotActionError {
    /// 対象が存在しないだけの無害な結果か
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            SnapshotActionError::NoSnapshots { .. } | SnapshotActionError::NoIndices { .. }
        )
    }
}
