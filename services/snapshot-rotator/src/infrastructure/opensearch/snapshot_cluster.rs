// OpenSearch Serviceのスナップショット管理API
//
// SnapshotClusterトレイトをOpenSearch REST APIで実装する。
// - GET    /_snapshot/{repository}/_all
// - GET    /_snapshot/_status
// - DELETE /_snapshot/{repository}/{snapshot}
// - GET    /_cat/indices?format=json&h=index
// - POST   /_snapshot/{repository}/_verify
// - PUT    /_snapshot/{repository}/{snapshot}?wait_for_completion=false
// - GET    /_snapshot/{repository}/{snapshot}

use async_trait::async_trait;
use opensearch::cat::CatIndicesParts;
use opensearch::http::response::Response;
use opensearch::snapshot::{
    SnapshotCreateParts, SnapshotDeleteParts, SnapshotGetParts, SnapshotStatusParts,
    SnapshotVerifyRepositoryParts,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::client::OpenSearchClient;
use crate::domain::SnapshotInfo;
use crate::infrastructure::snapshot_cluster::{ClusterError, SnapshotCluster};

/// `GET _snapshot/{repository}/_all`のレスポンス
#[derive(Debug, Deserialize)]
struct SnapshotsResponse {
    #[serde(default)]
    snapshots: Vec<SnapshotInfo>,
}

/// `GET _snapshot/_status`のレスポンス
#[derive(Debug, Deserialize)]
struct SnapshotStatusResponse {
    #[serde(default)]
    snapshots: Vec<RunningSnapshot>,
}

#[derive(Debug, Deserialize)]
struct RunningSnapshot {
    snapshot: String,
}

/// `GET _cat/indices?format=json`の1行
#[derive(Debug, Deserialize)]
struct CatIndexRow {
    index: String,
}

/// OpenSearch Serviceに対するSnapshotCluster実装
#[derive(Debug, Clone)]
pub struct OpenSearchSnapshotCluster {
    client: OpenSearchClient,
}

impl OpenSearchSnapshotCluster {
    pub fn new(client: OpenSearchClient) -> Self {
        Self { client }
    }

    /// ステータスコードを確認し、成功時のみボディをデシリアライズする
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClusterError> {
        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClusterError::InvalidResponse(e.to_string()))
    }

    async fn check_status(response: Response) -> Result<Response, ClusterError> {
        let status = response.status_code().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ClusterError::ErrorResponse { status, body });
        }
        Ok(response)
    }
}

fn request_failed(error: opensearch::Error) -> ClusterError {
    ClusterError::RequestFailed(error.to_string())
}

#[async_trait]
impl SnapshotCluster for OpenSearchSnapshotCluster {
    async fn list_snapshots(&self, repository: &str) -> Result<Vec<SnapshotInfo>, ClusterError> {
        let response = self
            .client
            .client()
            .snapshot()
            .get(SnapshotGetParts::RepositorySnapshot(repository, &["_all"]))
            .send()
            .await
            .map_err(request_failed)?;

        let body: SnapshotsResponse = Self::read_json(response).await?;
        debug!(
            repository = repository,
            count = body.snapshots.len(),
            "スナップショット一覧を取得"
        );
        Ok(body.snapshots)
    }

    async fn running_snapshots(&self) -> Result<Vec<String>, ClusterError> {
        let response = self
            .client
            .client()
            .snapshot()
            .status(SnapshotStatusParts::None)
            .send()
            .await
            .map_err(request_failed)?;

        let body: SnapshotStatusResponse = Self::read_json(response).await?;
        Ok(body
            .snapshots
            .into_iter()
            .map(|running| running.snapshot)
            .collect())
    }

    async fn delete_snapshot(&self, repository: &str, snapshot: &str) -> Result<(), ClusterError> {
        let response = self
            .client
            .client()
            .snapshot()
            .delete(SnapshotDeleteParts::RepositorySnapshot(repository, snapshot))
            .send()
            .await
            .map_err(request_failed)?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn list_indices(&self) -> Result<Vec<String>, ClusterError> {
        let response = self
            .client
            .client()
            .cat()
            .indices(CatIndicesParts::None)
            .format("json")
            .h(&["index"])
            .send()
            .await
            .map_err(request_failed)?;

        let rows: Vec<CatIndexRow> = Self::read_json(response).await?;
        Ok(rows.into_iter().map(|row| row.index).collect())
    }

    async fn verify_repository(&self, repository: &str) -> Result<(), ClusterError> {
        let response = self
            .client
            .client()
            .snapshot()
            .verify_repository(SnapshotVerifyRepositoryParts::Repository(repository))
            .send()
            .await
            .map_err(request_failed)?;

        Self::check_status(response).await?;
        debug!(repository = repository, "リポジトリの検証に成功");
        Ok(())
    }

    async fn create_snapshot(
        &self,
        repository: &str,
        snapshot: &str,
        indices: &[String],
    ) -> Result<(), ClusterError> {
        // 開始のみ。完了はget_snapshotで確認する
        let response = self
            .client
            .client()
            .snapshot()
            .create(SnapshotCreateParts::RepositorySnapshot(repository, snapshot))
            .wait_for_completion(false)
            .body(snapshot_body(indices))
            .send()
            .await
            .map_err(request_failed)?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn get_snapshot(
        &self,
        repository: &str,
        snapshot: &str,
    ) -> Result<SnapshotInfo, ClusterError> {
        let response = self
            .client
            .client()
            .snapshot()
            .get(SnapshotGetParts::RepositorySnapshot(repository, &[snapshot]))
            .send()
            .await
            .map_err(request_failed)?;

        let body: SnapshotsResponse = Self::read_json(response).await?;
        find_snapshot(body, snapshot)
    }
}

/// レスポンスから指定名のスナップショットを取り出す
fn find_snapshot(body: SnapshotsResponse, snapshot: &str) -> Result<SnapshotInfo, ClusterError> {
    body.snapshots
        .into_iter()
        .find(|info| info.name == snapshot)
        .ok_or_else(|| {
            ClusterError::InvalidResponse(format!("スナップショット {snapshot} がレスポンスに含まれていません"))
        })
}

/// スナップショット作成リクエストのボディ
fn snapshot_body(indices: &[String]) -> serde_json::Value {
    json!({
        "indices": indices.join(","),
        "ignore_unavailable": false,
        "include_global_state": true,
        "partial": false,
    })
}
