//! # トレーシング初期化
//!
//! 学費管理クライアントを組み込むプロセス（コンソールなど）のログ出力を設定する。
//!
//! - 出力形式は `LOG_FORMAT`（`json` / `pretty`）で選ぶ
//! - フィルタは `RUST_LOG`、未設定なら [`DEFAULT_FILTER`]
//! - [`init_tracing`] はアプリ名を持つ `app` スパンに入った状態のガードを返す。
//!   JSON 出力では各イベントの `span.app` にアプリ名が載る

use std::str::FromStr;

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_FILTER: &str = "info,schoolfee=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 行 1 イベントの JSON
    Json,
    #[default]
    Pretty,
}

/// `LOG_FORMAT` に解釈できない値が入っていた
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown LOG_FORMAT: {0:?}")]
pub struct UnknownLogFormat(pub String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(UnknownLogFormat(other.to_string())),
        }
    }
}

impl LogFormat {
    /// 環境変数 `LOG_FORMAT` から読み取る
    ///
    /// 不正な値はサブスクライバ設定前なので stderr に警告して Pretty にする。
    pub fn from_env() -> Self {
        let Ok(value) = std::env::var("LOG_FORMAT") else {
            return Self::default();
        };
        value.parse().unwrap_or_else(|e: UnknownLogFormat| {
            eprintln!("WARNING: {e}, falling back to pretty");
            Self::default()
        })
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// `app` スパンに記録するアプリ名
    pub app_name:   String,
    pub log_format: LogFormat,
    /// `EnvFilter` のディレクティブ
    pub filter:     String,
}

impl TracingConfig {
    pub fn new(app_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            app_name: app_name.into(),
            log_format,
            filter: DEFAULT_FILTER.to_string(),
        }
    }

    /// フィルタを差し替える
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// `LOG_FORMAT` と `RUST_LOG` から組み立てる
    pub fn from_env(app_name: impl Into<String>) -> Self {
        let config = Self::new(app_name, LogFormat::from_env());
        match std::env::var("RUST_LOG") {
            Ok(filter) if !filter.trim().is_empty() => config.with_filter(filter),
            _ => config,
        }
    }
}

#[cfg(feature = "observability")]
impl TracingConfig {
    /// アプリ名を `app` フィールドに持つルートスパン
    pub fn app_span(&self) -> tracing::Span {
        tracing::info_span!("app", app = self.app_name.as_str())
    }

    /// 設定どおりのサブスクライバを組み立てる
    ///
    /// 書き込み先を受け取るので、テストではバッファに出力させられる。
    /// フィルタが解釈できない場合は [`DEFAULT_FILTER`] を使う。
    pub fn subscriber<W>(&self, writer: W) -> impl tracing::Subscriber + Send + Sync + use<W>
    where
        W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt};

        let env_filter = EnvFilter::try_new(&self.filter).unwrap_or_else(|e| {
            eprintln!(
                "WARNING: invalid log filter {:?} ({e}), using {DEFAULT_FILTER:?}",
                self.filter
            );
            EnvFilter::new(DEFAULT_FILTER)
        });

        let fmt_layer = match self.log_format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_target(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(writer)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer().with_writer(writer).boxed(),
        };

        tracing_subscriber::registry().with(env_filter).with(fmt_layer)
    }
}

/// グローバルサブスクライバを設定し、`app` スパンに入る
///
/// 戻り値のガードを保持している間のイベントはアプリ名付きで出力される。
#[cfg(feature = "observability")]
pub fn init_tracing(config: TracingConfig) -> tracing::span::EnteredSpan {
    use tracing_subscriber::util::SubscriberInitExt as _;

    config.subscriber(std::io::stderr).init();
    config.app_span().entered()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("pretty", LogFormat::Pretty)]
    fn test_log_formatを解釈する(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(input.parse::<LogFormat>(), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("JSON")]
    #[case("logfmt")]
    fn test_不正なlog_formatはエラー(#[case] input: &str) {
        assert_eq!(
            input.parse::<LogFormat>(),
            Err(UnknownLogFormat(input.to_string()))
        );
    }

    #[test]
    fn test_newは既定のフィルタを使う() {
        let config = TracingConfig::new("fee-console", LogFormat::Json);

        assert_eq!(config.app_name, "fee-console");
        assert_eq!(config.filter, DEFAULT_FILTER);
        assert_eq!(config.with_filter("warn").filter, "warn");
    }

    #[cfg(feature = "observability")]
    mod capture {
        use std::{
            io,
            sync::{Arc, Mutex},
        };

        use pretty_assertions::assert_eq;

        use super::super::*;

        #[derive(Clone, Default)]
        struct Buffer(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Buffer {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        impl Buffer {
            fn lines(&self) -> Vec<serde_json::Value> {
                let bytes = self.0.lock().unwrap().clone();
                String::from_utf8(bytes)
                    .unwrap()
                    .lines()
                    .map(|line| serde_json::from_str(line).unwrap())
                    .collect()
            }
        }

        fn capture(config: &TracingConfig, emit: impl FnOnce()) -> Vec<serde_json::Value> {
            let buffer = Buffer::default();
            let writer = buffer.clone();
            let subscriber = config.subscriber(move || writer.clone());
            tracing::subscriber::with_default(subscriber, || {
                let _app = config.app_span().entered();
                emit();
            });
            buffer.lines()
        }

        #[test]
        fn test_json出力にアプリ名が載る() {
            let config = TracingConfig::new("fee-console", LogFormat::Json).with_filter("info");

            let lines = capture(&config, || tracing::info!(student_id = 7, "生徒を取得しました"));

            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0]["span"]["app"], "fee-console");
            assert_eq!(lines[0]["span"]["name"], "app");
            assert_eq!(lines[0]["student_id"], 7);
            assert_eq!(lines[0]["message"], "生徒を取得しました");
        }

        #[test]
        fn test_フィルタより低いレベルは出力しない() {
            let config = TracingConfig::new("fee-console", LogFormat::Json).with_filter("info");

            let lines = capture(&config, || {
                tracing::debug!("出ない");
                tracing::warn!("出る");
            });

            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0]["message"], "出る");
            assert_eq!(lines[0]["level"], "WARN");
        }

        #[test]
        fn test_不正なフィルタは既定値にフォールバックする() {
            let config =
                TracingConfig::new("fee-console", LogFormat::Json).with_filter("schoolfee=loud");

            let lines = capture(&config, || tracing::info!("出る"));

            assert_eq!(lines.len(), 1);
        }
    }
}
