// アプリケーション層モジュール
pub mod snapshot_rotator;

// 再エクスポート
pub use snapshot_rotator::{
    DailySnapshotRotator, PhaseError, PhaseOutcome, RetryPolicy, RotationError, RotationReport,
};
