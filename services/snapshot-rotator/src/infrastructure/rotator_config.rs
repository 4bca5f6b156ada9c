// スナップショットローテーション設定
//
// 環境変数から接続先クラスタ、リポジトリ、インデックス名の規則を読み取る。
// 呼び出しの開始時に一度だけ読み込み、以降は変更しない。

use thiserror::Error;

use crate::domain::IndexNameRule;

/// クラスタのホスト名（例: search-my-domain.us-west-1.es.amazonaws.com）
pub const HOST_VAR: &str = "host";
/// クラスタのリージョン（例: us-west-1）
pub const REGION_VAR: &str = "region";
/// スナップショットリポジトリ名
pub const REPOSITORY_VAR: &str = "es_snapshot_repository";
/// インデックス名のプレフィックス
pub const INDEX_PREFIX_VAR: &str = "index_prefix";
/// 日付フォーマット（strftime形式、例: %Y-%m-%d）
pub const DATE_PATTERN_VAR: &str = "date_string";

/// クラスタへの接続ポート（HTTPS）
pub const CLUSTER_PORT: u16 = 443;

/// ローテーション設定のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RotatorConfigError {
    /// 環境変数が欠落
    #[error("環境変数が設定されていません: {0}")]
    MissingEnvVar(String),
}

/// ローテーション設定
///
/// 環境変数（すべて必須、デフォルト値なし）:
/// - host
/// - region
/// - es_snapshot_repository
/// - index_prefix
/// - date_string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatorConfig {
    host: String,
    region: String,
    repository: String,
    index_prefix: String,
    date_pattern: String,
}

impl RotatorConfig {
    /// 明示的な値で設定を作成（テスト用）
    pub fn new(
        host: impl Into<String>,
        region: impl Into<String>,
        repository: impl Into<String>,
        index_prefix: impl Into<String>,
        date_pattern: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            region: region.into(),
            repository: repository.into(),
            index_prefix: index_prefix.into(),
            date_pattern: date_pattern.into(),
        }
    }

    /// 環境変数から設定を読み込む
    ///
    /// # エラー
    /// - `MissingEnvVar`: いずれかの環境変数が設定されていない
    pub fn from_env() -> Result<Self, RotatorConfigError> {
        Ok(Self {
            host: required_var(HOST_VAR)?,
            region: required_var(REGION_VAR)?,
            repository: required_var(REPOSITORY_VAR)?,
            index_prefix: required_var(INDEX_PREFIX_VAR)?,
            date_pattern: required_var(DATE_PATTERN_VAR)?,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn index_prefix(&self) -> &str {
        &self.index_prefix
    }

    pub fn date_pattern(&self) -> &str {
        &self.date_pattern
    }

    /// クラスタのエンドポイントURL（`https://{host}:443`）
    pub fn endpoint(&self) -> String {
        format!("https://{}:{}", self.host, CLUSTER_PORT)
    }

    /// インデックス名の生成規則
    pub fn index_name_rule(&self) -> IndexNameRule {
        IndexNameRule::new(&self.index_prefix, &self.date_pattern)
    }
}

fn required_var(name: &str) -> Result<String, RotatorConfigError> {
    std::env::var(name).map_err(|_| RotatorConfigError::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serial_test::serial;

    const ALL_VARS: [&str; 5] = [
        HOST_VAR,
        REGION_VAR,
        REPOSITORY_VAR,
        INDEX_PREFIX_VAR,
        DATE_PATTERN_VAR,
    ];

    // テストで環境変数を設定/削除するヘルパー
    // 安全性: #[serial]でシングルスレッド実行されるテストからのみ呼び出す
    unsafe fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    unsafe fn set_all() {
        unsafe {
            set_env(HOST_VAR, "search-example.us-west-1.es.amazonaws.com");
            set_env(REGION_VAR, "us-west-1");
            set_env(REPOSITORY_VAR, "daily-snapshots");
            set_env(INDEX_PREFIX_VAR, "logs-");
            set_env(DATE_PATTERN_VAR, "%Y-%m-%d");
        }
    }

    unsafe fn cleanup() {
        for var in ALL_VARS {
            unsafe { remove_env(var) };
        }
    }

    #[test]
    #[serial]
    fn test_from_env_all_present() {
        unsafe { set_all() };

        let config = RotatorConfig::from_env().expect("設定読み込みに失敗");

        assert_eq!(config.host(), "search-example.us-west-1.es.amazonaws.com");
        assert_eq!(config.region(), "us-west-1");
        assert_eq!(config.repository(), "daily-snapshots");
        assert_eq!(config.index_prefix(), "logs-");
        assert_eq!(config.date_pattern(), "%Y-%m-%d");

        unsafe { cleanup() };
    }

    #[test]
    #[serial]
    fn test_from_env_each_var_is_required() {
        for missing in ALL_VARS {
            unsafe {
                set_all();
                remove_env(missing);
            }

            let result = RotatorConfig::from_env();

            assert_eq!(
                result,
                Err(RotatorConfigError::MissingEnvVar(missing.to_string()))
            );
        }

        unsafe { cleanup() };
    }

    #[test]
    fn test_endpoint_uses_https_443() {
        let config = RotatorConfig::new(
            "search-example.us-west-1.es.amazonaws.com",
            "us-west-1",
            "daily-snapshots",
            "logs-",
            "%Y-%m-%d",
        );

        assert_eq!(
            config.endpoint(),
            "https://search-example.us-west-1.es.amazonaws.com:443"
        );
    }

    #[test]
    fn test_index_name_rule_from_config() {
        let config = RotatorConfig::new("h", "r", "repo", "logs-", "%Y-%m-%d");
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 3, 0, 0).unwrap();

        let name = config.index_name_rule().index_name_for(now).unwrap();

        assert_eq!(name, "logs-2024-03-14");
    }

    #[test]
    fn test_error_display_missing_env_var() {
        let error = RotatorConfigError::MissingEnvVar("host".to_string());
        assert_eq!(error.to_string(), "環境変数が設定されていません: host");
    }
}
