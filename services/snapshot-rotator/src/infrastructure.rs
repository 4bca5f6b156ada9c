// Infrastructure layer modules
pub mod logging;
pub mod opensearch;
pub mod rotator_config;
pub mod snapshot_cluster;

// Re-exports
pub use logging::init_logging;
pub use opensearch::{OpenSearchClient, OpenSearchClientError, OpenSearchSnapshotCluster};
pub use rotator_config::{RotatorConfig, RotatorConfigError};
pub use snapshot_cluster::{ClusterError, SnapshotCluster};
