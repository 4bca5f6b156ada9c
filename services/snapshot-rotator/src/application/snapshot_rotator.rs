/// 日次スナップショットのローテーション
///
/// 前日のインデックス名と同名の既存スナップショットを削除し（削除フェーズ）、
/// 前日のインデックスのスナップショットを新たに取得する（取得フェーズ）。
///
/// 2つのフェーズは独立しており、想定内の失敗（`SnapshotActionError`）は
/// フェーズ内でログに記録して次へ進む。それ以外のクラスタエラーは呼び出し元へ返す。
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::{
    IndexNameError, IndexNameRule, PrefixFilter, SnapshotActionError, SnapshotInfo, SnapshotState,
};
use crate::infrastructure::rotator_config::RotatorConfig;
use crate::infrastructure::snapshot_cluster::{ClusterError, SnapshotCluster};

/// 削除の再試行間隔（デフォルト）
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// 削除の試行回数（デフォルト）
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// スナップショット完了確認の間隔（デフォルト）
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(9);

/// 実行全体を失敗させるエラー
#[derive(Debug, Error)]
pub enum RotationError {
    /// インデックス名を算出できない
    #[error(transparent)]
    IndexName(#[from] IndexNameError),

    /// 想定外のクラスタエラー
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// フェーズ内のエラー
///
/// `Action`はフェーズ内で記録され、`Cluster`は実行全体を失敗させる。
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Action(#[from] SnapshotActionError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// 削除の再試行ポリシー
///
/// `count`が0の場合も1回は試行する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 試行の間隔
    pub interval: Duration,
    /// 最大試行回数
    pub count: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            count: DEFAULT_RETRY_COUNT,
        }
    }
}

/// 1フェーズの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome<T> {
    /// 操作が完了した
    Completed(T),
    /// 対象が存在しなかった
    Skipped(SnapshotActionError),
    /// 操作に失敗した（記録済み）
    Failed(SnapshotActionError),
}

impl<T> PhaseOutcome<T> {
    fn from_action_error(error: SnapshotActionError) -> Self {
        if error.is_benign() {
            PhaseOutcome::Skipped(error)
        } else {
            PhaseOutcome::Failed(error)
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PhaseOutcome::Completed(_))
    }
}

/// 1回の実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    /// 対象のインデックス名（スナップショット名）
    pub index_name: String,
    /// 削除フェーズの結果（削除したスナップショット名）
    pub delete: PhaseOutcome<Vec<String>>,
    /// 取得フェーズの結果（作成したスナップショット）
    pub snapshot: PhaseOutcome<SnapshotInfo>,
}

/// 日次スナップショットローテーター
pub struct DailySnapshotRotator<C>
where
    C: SnapshotCluster,
{
    cluster: C,
    repository: String,
    rule: IndexNameRule,
    retry: RetryPolicy,
    poll_interval: Duration,
}

impl<C> DailySnapshotRotator<C>
where
    C: SnapshotCluster,
{
    /// 新しいローテーターを作成
    pub fn new(cluster: C, repository: impl Into<String>, rule: IndexNameRule) -> Self {
        Self {
            cluster,
            repository: repository.into(),
            rule,
            retry: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// 設定からローテーターを作成
    pub fn from_config(cluster: C, config: &RotatorConfig) -> Self {
        Self::new(cluster, config.repository(), config.index_name_rule())
    }

    /// 削除の再試行ポリシーを変更
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// スナップショット完了確認の間隔を変更
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// 現在時刻を基準にローテーションを実行
    pub async fn run(&self) -> Result<RotationReport, RotationError> {
        self.run_at(Utc::now()).await
    }

    /// 指定時刻を基準にローテーションを実行
    ///
    /// # 処理フロー
    /// 1. `now - 1日`からインデックス名を算出
    /// 2. 削除フェーズ: 同名プレフィックスの既存スナップショットを削除
    /// 3. 取得フェーズ: 同名プレフィックスのインデックスのスナップショットを作成
    ///
    /// 削除フェーズが失敗しても取得フェーズは実行する。
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RotationReport, RotationError> {
        let index_name = self.rule.index_name_for(now)?;

        info!(
            repository = %self.repository,
            index_name = %index_name,
            "スナップショットのローテーションを開始"
        );

        let delete = match self.delete_existing(&index_name).await {
            Ok(deleted) => PhaseOutcome::Completed(deleted),
            Err(PhaseError::Action(e)) => {
                if e.is_benign() {
                    info!(index_name = %index_name, "削除対象のスナップショットがありません");
                } else {
                    error!(
                        index_name = %index_name,
                        error = %e,
                        detail = ?e,
                        "スナップショットの削除に失敗"
                    );
                }
                PhaseOutcome::from_action_error(e)
            }
            Err(PhaseError::Cluster(e)) => return Err(e.into()),
        };

        let snapshot = match self.take_snapshot(&index_name).await {
            Ok(created) => PhaseOutcome::Completed(created),
            Err(PhaseError::Action(e)) => {
                if e.is_benign() {
                    warn!(index_name = %index_name, "スナップショット対象のインデックスがありません");
                } else {
                    error!(
                        index_name = %index_name,
                        error = %e,
                        detail = ?e,
                        "スナップショットの取得に失敗"
                    );
                }
                PhaseOutcome::from_action_error(e)
            }
            Err(PhaseError::Cluster(e)) => return Err(e.into()),
        };

        info!(
            index_name = %index_name,
            delete_completed = delete.is_completed(),
            snapshot_completed = snapshot.is_completed(),
            "スナップショットのローテーションが完了"
        );

        Ok(RotationReport {
            index_name,
            delete,
            snapshot,
        })
    }

    /// 削除フェーズ
    ///
    /// # 戻り値
    /// * `Ok(Vec<String>)` - 削除したスナップショット名
    /// * `Err(PhaseError::Action(NoSnapshots))` - 一致するスナップショットがない
    /// * `Err(PhaseError::Action(SnapshotInProgress | FailedExecution))` - 削除に失敗
    pub async fn delete_existing(&self, index_name: &str) -> Result<Vec<String>, PhaseError> {
        let filter = PrefixFilter::new(index_name);
        let snapshots = self.cluster.list_snapshots(&self.repository).await?;
        let targets = filter.select(snapshots.iter().map(|info| info.name.as_str()));

        if targets.is_empty() {
            return Err(SnapshotActionError::NoSnapshots {
                prefix: index_name.to_string(),
            }
            .into());
        }

        info!(
            repository = %self.repository,
            snapshots = ?targets,
            "既存のスナップショットを削除"
        );

        for target in &targets {
            self.delete_with_retry(target).await?;
        }

        Ok(targets)
    }

    /// 実行中のスナップショット処理がなくなるのを待ってから1件削除する
    ///
    /// 実行中の確認、または競合による削除拒否のたびに1回の試行を消費し、
    /// 試行の間は`retry.interval`だけ待機する。
    async fn delete_with_retry(&self, snapshot: &str) -> Result<(), PhaseError> {
        let attempts = self.retry.count.max(1);

        for attempt in 1..=attempts {
            let running = self.cluster.running_snapshots().await?;

            if running.is_empty() {
                match self.cluster.delete_snapshot(&self.repository, snapshot).await {
                    Ok(()) => {
                        info!(snapshot = snapshot, attempt = attempt, "スナップショットを削除");
                        return Ok(());
                    }
                    Err(e) if e.is_concurrent_snapshot() => {
                        warn!(
                            snapshot = snapshot,
                            attempt = attempt,
                            error = %e,
                            "他のスナップショット処理と競合したため削除を再試行"
                        );
                    }
                    Err(ClusterError::ErrorResponse { status, body }) => {
                        return Err(SnapshotActionError::FailedExecution(format!(
                            "スナップショット {} の削除に失敗 (status: {}): {}",
                            snapshot, status, body
                        ))
                        .into());
                    }
                    Err(e) => return Err(e.into()),
                }
            } else {
                warn!(
                    snapshot = snapshot,
                    attempt = attempt,
                    running = ?running,
                    "スナップショット処理が実行中のため削除を待機"
                );
            }

            if attempt < attempts {
                tokio::time::sleep(self.retry.interval).await;
            }
        }

        Err(SnapshotActionError::SnapshotInProgress(format!(
            "スナップショット {} を{}回の試行で削除できませんでした",
            snapshot, attempts
        ))
        .into())
    }

    /// 取得フェーズ
    ///
    /// プレフィックスに一致するインデックスを対象に、`index_name`という名前の
    /// スナップショットの作成を開始し、完了まで`poll_interval`ごとに状態を確認する。
    pub async fn take_snapshot(&self, index_name: &str) -> Result<SnapshotInfo, PhaseError> {
        let filter = PrefixFilter::new(index_name);
        let indices = self.cluster.list_indices().await?;
        let targets = filter.select(indices.iter().map(String::as_str));

        if targets.is_empty() {
            return Err(SnapshotActionError::NoIndices {
                prefix: index_name.to_string(),
            }
            .into());
        }

        match self.cluster.verify_repository(&self.repository).await {
            Ok(()) => {}
            Err(ClusterError::ErrorResponse { status, body }) => {
                return Err(SnapshotActionError::FailedExecution(format!(
                    "リポジトリ {} の検証に失敗 (status: {}): {}",
                    self.repository, status, body
                ))
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        let running = self.cluster.running_snapshots().await?;
        if !running.is_empty() {
            return Err(SnapshotActionError::SnapshotInProgress(format!(
                "実行中のスナップショット: {}",
                running.join(",")
            ))
            .into());
        }

        info!(
            repository = %self.repository,
            snapshot = index_name,
            indices = ?targets,
            "スナップショットを作成中（完了まで待機）"
        );

        match self
            .cluster
            .create_snapshot(&self.repository, index_name, &targets)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_concurrent_snapshot() => {
                return Err(SnapshotActionError::SnapshotInProgress(e.to_string()).into());
            }
            Err(ClusterError::ErrorResponse { status, body }) => {
                return Err(SnapshotActionError::FailedExecution(format!(
                    "スナップショット {} の作成に失敗 (status: {}): {}",
                    index_name, status, body
                ))
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        let created = self.wait_for_completion(index_name).await?;

        if !created.state.is_success() {
            return Err(SnapshotActionError::FailedExecution(format!(
                "スナップショット {} が状態 {} で終了しました",
                created.name, created.state
            ))
            .into());
        }

        info!(
            snapshot = %created.name,
            indices = ?created.indices,
            "スナップショットの作成が完了"
        );

        Ok(created)
    }

    /// スナップショットの状態がIN_PROGRESSでなくなるまで待機する
    async fn wait_for_completion(&self, snapshot: &str) -> Result<SnapshotInfo, PhaseError> {
        let mut polls = 0u32;

        loop {
            polls += 1;
            let info = match self.cluster.get_snapshot(&self.repository, snapshot).await {
                Ok(info) => info,
                Err(ClusterError::ErrorResponse { status, body }) => {
                    return Err(SnapshotActionError::FailedExecution(format!(
                        "スナップショット {} の状態取得に失敗 (status: {}): {}",
                        snapshot, status, body
                    ))
                    .into());
                }
                Err(e) => return Err(e.into()),
            };

            if info.state != SnapshotState::InProgress {
                debug!(snapshot = snapshot, polls = polls, state = %info.state, "スナップショットが終了");
                return Ok(info);
            }

            debug!(snapshot = snapshot, polls = polls, "スナップショット作成中");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
