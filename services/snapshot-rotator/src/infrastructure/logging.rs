/// ログ基盤モジュール
///
/// CloudWatch Logs向けにJSON形式の構造化ログを出力する。
use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Lambda環境向けのログサブスクライバーを初期化する
///
/// `RUST_LOG`でフィルタリングし、未設定の場合はinfoレベル以上を出力する。
/// 複数回呼び出しても最初の呼び出しのみ初期化を行う。
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true)
            .with_current_span(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .init();
    });
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    });
}

/// テスト内で出力されたログイベントを記録するレイヤー
///
/// `capture_logs()`が返すガードの生存中、そのスレッドで出力されたイベントの
/// レベルと`message`を記録する。
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    events: std::sync::Arc<std::sync::Mutex<Vec<(tracing::Level, String)>>>,
}

#[cfg(test)]
impl CapturedLogs {
    pub fn events(&self) -> Vec<(tracing::Level, String)> {
        self.events.lock().unwrap().clone()
    }

    /// 指定レベルのイベント数
    pub fn count_level(&self, level: tracing::Level) -> usize {
        self.events()
            .iter()
            .filter(|(event_level, _)| *event_level == level)
            .count()
    }

    /// 指定レベルかつ指定メッセージのイベント数
    pub fn count(&self, level: tracing::Level, message: &str) -> usize {
        self.events()
            .iter()
            .filter(|(event_level, event_message)| *event_level == level && event_message == message)
            .count()
    }
}

#[cfg(test)]
struct MessageVisitor(String);

#[cfg(test)]
impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }
}

#[cfg(test)]
impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CapturedLogs {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

/// 現在のスレッドのログイベントを記録するサブスクライバーを設定する
///
/// `#[tokio::test]`（current_thread）内の非同期処理のログもこのスレッドで記録される。
#[cfg(test)]
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let captured = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(captured.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_logging_idempotent() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_json_layer_configuration() {
        let env_filter = EnvFilter::new("info");
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .flatten_event(true);

        let _subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer);
    }

    /// フェーズ単位のspanとフィールド付きログが出力できることを確認
    #[test]
    fn test_rotation_span_fields() {
        init_test_logging();

        let span = tracing::info_span!(
            "rotation",
            repository = "daily-snapshots",
            index_name = "logs-2024-03-14"
        );
        let _guard = span.enter();

        tracing::info!(phase = "delete", "削除対象のスナップショットがありません");
        tracing::warn!(phase = "snapshot", "スナップショット対象のインデックスがありません");
    }

    #[test]
    fn test_capture_logs_records_level_and_message() {
        let (logs, _guard) = capture_logs();

        tracing::info!(index_name = "logs-2024-03-14", "削除対象のスナップショットがありません");
        tracing::error!(error = "boom", "スナップショットの取得に失敗");

        assert_eq!(
            logs.events(),
            vec![
                (
                    tracing::Level::INFO,
                    "削除対象のスナップショットがありません".to_string()
                ),
                (tracing::Level::ERROR, "スナップショットの取得に失敗".to_string()),
            ]
        );
        assert_eq!(logs.count_level(tracing::Level::WARN), 0);
    }
}
