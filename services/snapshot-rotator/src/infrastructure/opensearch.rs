// OpenSearch関連のインフラストラクチャ実装
//
// OpenSearch Serviceへの署名付き接続と、スナップショットAPIの呼び出しを提供する。

mod client;
mod snapshot_cluster;

// 再エクスポート
pub use client::{OpenSearchClient, OpenSearchClientError, REQUEST_TIMEOUT, SERVICE_NAME};
pub use snapshot_cluster::OpenSearchSnapshotCluster;
