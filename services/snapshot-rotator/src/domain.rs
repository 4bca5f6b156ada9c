// Domain layer modules
pub mod index_name;
pub mod prefix_filter;
pub mod snapshot;
pub mod snapshot_error;

// Re-exports
pub use index_name::{IndexNameError, IndexNameRule};
pub use prefix_filter::PrefixFilter;
pub use snapshot::{SnapshotInfo, SnapshotState};
pub use snapshot_error::SnapshotActionError;
