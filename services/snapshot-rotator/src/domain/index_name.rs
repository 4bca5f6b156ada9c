/// 日次インデックス名の算出
///
/// インデックス名は「プレフィックス + 前日(UTC)の日付」で表される。
/// 同じ名前をスナップショット名としても使用する。
use std::fmt::Write;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

/// インデックス名算出のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexNameError {
    /// chronoが解釈できない日付フォーマット
    #[error("日付フォーマットを解釈できません: {0}")]
    InvalidDatePattern(String),
}

/// インデックス名の生成規則
///
/// `date_pattern`はstrftime形式（例: `%Y-%m-%d`）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNameRule {
    prefix: String,
    date_pattern: String,
}

impl IndexNameRule {
    pub fn new(prefix: impl Into<String>, date_pattern: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            date_pattern: date_pattern.into(),
        }
    }

    /// 指定時刻の前日を対象としたインデックス名を返す
    ///
    /// `now - 1日`をUTCで日付フォーマットし、プレフィックスの後ろに連結する。
    /// 同じ`now`に対して常に同じ結果を返す。
    ///
    /// # エラー
    /// - `InvalidDatePattern`: フォーマット文字列に不正な指定子が含まれる
    pub fn index_name_for(&self, now: DateTime<Utc>) -> Result<String, IndexNameError> {
        let yesterday = now - TimeDelta::days(1);

        let mut name = self.prefix.clone();
        // 不正な指定子はDisplay時にfmt::Errorとなるため、to_string()ではなくwrite!で受ける
        write!(name, "{}", yesterday.format(&self.date_pattern))
            .map_err(|_| IndexNameError::InvalidDatePattern(self.date_pattern.clone()))?;

        Ok(name)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn date_pattern(&self) -> &str {
        &self.date_pattern
    }
}
