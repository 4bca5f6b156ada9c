/// スナップショットのモデル
///
/// `GET _snapshot/{repository}/_all`や`PUT _snapshot/{repository}/{name}`の
/// レスポンスに含まれるスナップショット情報。
use serde::Deserialize;

/// スナップショットの状態
///
/// クラスタが返す文字列表現（`SUCCESS`など）から変換する。
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum SnapshotState {
    Success,
    InProgress,
    Partial,
    Failed,
    Incompatible,
    /// レスポンスに状態が含まれていない
    #[default]
    Unknown,
    Other(String),
}

impl SnapshotState {
    pub fn is_success(&self) -> bool {
        matches!(self, SnapshotState::Success)
    }

    pub fn as_str(&self) -> &str {
        match self {
            SnapshotState::Success => "SUCCESS",
            SnapshotState::InProgress => "IN_PROGRESS",
            SnapshotState::Partial => "PARTIAL",
            SnapshotState::Failed => "FAILED",
            SnapshotState::Incompatible => "INCOMPATIBLE",
            SnapshotState::Unknown => "UNKNOWN",
            SnapshotState::Other(state) => state,
        }
    }
}

impl From<String> for SnapshotState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "SUCCESS" => SnapshotState::Success,
            "IN_PROGRESS" => SnapshotState::InProgress,
            "PARTIAL" => SnapshotState::Partial,
            "FAILED" => SnapshotState::Failed,
            "INCOMPATIBLE" => SnapshotState::Incompatible,
            _ => SnapshotState::Other(state),
        }
    }
}

impl std::fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// スナップショット情報
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotInfo {
    /// スナップショット名
    #[serde(rename = "snapshot")]
    pub name: String,
    /// 状態
    #[serde(default)]
    pub state: SnapshotState,
    /// 含まれるインデックス
    #[serde(default)]
    pub indices: Vec<String>,
}

impl SnapshotInfo {
    pub fn new(name: impl Into<String>, state: SnapshotState) -> Self {
        Self {
            name: name.into(),
            state,
            indices: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_from_cluster_strings() {
        assert_eq!(SnapshotState::from("SUCCESS".to_string()), SnapshotState::Success);
        assert_eq!(
            SnapshotState::from("IN_PROGRESS".to_string()),
            SnapshotState::InProgress
        );
        assert_eq!(SnapshotState::from("PARTIAL".to_string()), SnapshotState::Partial);
        assert_eq!(SnapshotState::from("FAILED".to_string()), SnapshotState::Failed);
        assert_eq!(
            SnapshotState::from("STARTED".to_string()),
            SnapshotState::Other("STARTED".to_string())
        );
    }

    #[test]
    fn test_only_success_is_success() {
        assert!(SnapshotState::Success.is_success());
        assert!(!SnapshotState::Partial.is_success());
        assert!(!SnapshotState::Unknown.is_success());
        assert!(!SnapshotState::Other("SUCCESS ".to_string()).is_success());
    }

    #[test]
    fn test_deserialize_snapshot_info() {
        let value = json!({
            "snapshot": "logs-2024-03-14",
            "uuid": "dKb54xw67gvdRctLCxSket",
            "state": "SUCCESS",
            "indices": ["logs-2024-03-14"],
            "shards": { "total": 5, "failed": 0, "successful": 5 }
        });

        let info: SnapshotInfo = serde_json::from_value(value).unwrap();

        assert_eq!(info.name, "logs-2024-03-14");
        assert_eq!(info.state, SnapshotState::Success);
        assert_eq!(info.indices, vec!["logs-2024-03-14"]);
    }

    #[test]
    fn test_deserialize_snapshot_info_without_state() {
        let info: SnapshotInfo =
            serde_json::from_value(json!({ "snapshot": "logs-2024-03-14" })).unwrap();

        assert_eq!(info.state, SnapshotState::Unknown);
        assert!(info.indices.is_empty());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SnapshotState::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(SnapshotState::Other("STARTED".to_string()).to_string(), "STARTED");
    }
}
