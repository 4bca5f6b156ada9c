/// 日次スナップショットローテーションLambda関数
///
/// スケジューラ（EventBridge等）から起動され、前日のインデックスと同名の
/// 既存スナップショットを削除した上で、新しいスナップショットを作成する。
/// Lambda関数としても、ローカルスクリプトとしても実行可能。
///
/// # 環境変数
/// - host: OpenSearchドメインのホスト名（必須）
/// - region: OpenSearchドメインのリージョン（必須）
/// - es_snapshot_repository: スナップショットリポジトリ名（必須）
/// - index_prefix: インデックス名のプレフィックス（必須）
/// - date_string: 日付フォーマット、例: %Y-%m-%d（必須）
///
/// # ローカル実行
/// ```bash
/// export host=search-my-domain.us-west-1.es.amazonaws.com
/// export region=us-west-1
/// export es_snapshot_repository=daily-snapshots
/// export index_prefix=logs-
/// export date_string=%Y-%m-%d
/// cargo run --bin daily_snapshot
/// ```
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use snapshot_rotator::application::DailySnapshotRotator;
use snapshot_rotator::infrastructure::{
    init_logging, OpenSearchClient, OpenSearchSnapshotCluster, RotatorConfig,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    if std::env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() {
        info!("Lambda関数として起動");
        let func = service_fn(handler);
        lambda_runtime::run(func).await?;
    } else {
        info!("ローカルスクリプトとして起動");
        rotate().await?;
    }

    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// スケジューラからのイベントペイロードは使用しない。
async fn handler(_event: LambdaEvent<Value>) -> Result<(), Error> {
    rotate().await
}

/// ローテーションを1回実行
///
/// 想定内の失敗（対象なし、実行中、操作失敗）はログに記録して成功扱いとし、
/// 設定不備やクラスタへの接続失敗はエラーとして返す（呼び出し失敗として記録される）。
async fn rotate() -> Result<(), Error> {
    let config = RotatorConfig::from_env().map_err(|e| {
        error!(error = %e, "ローテーション設定読み込み失敗");
        e
    })?;

    let client = OpenSearchClient::new(&config).await.map_err(|e| {
        error!(error = %e, "OpenSearchクライアント初期化失敗");
        e
    })?;

    let rotator = DailySnapshotRotator::from_config(OpenSearchSnapshotCluster::new(client), &config);

    let report = rotator.run().await.map_err(|e| {
        error!(error = %e, "スナップショットのローテーションに失敗");
        e
    })?;

    info!(
        index_name = %report.index_name,
        delete = ?report.delete,
        snapshot = ?report.snapshot,
        "処理結果"
    );

    Ok(())
}
