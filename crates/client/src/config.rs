//! # クライアント設定
//!
//! 環境変数から HTTP クライアントの設定を読み込む。
//!
//! | 環境変数 | 既定値 | 内容 |
//! |---------|-------|------|
//! | `SCHOOLFEE_API_URL` | `http://localhost:5000/api` | バックエンドのベース URL |
//! | `SCHOOLFEE_TIMEOUT_SECS` | `30` | リクエストのタイムアウト（秒） |
//! | `SCHOOLFEE_LOGIN_ROUTE` | `/login` | セッション切れ時の遷移先 |

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// 既定のベース URL
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// 既定のタイムアウト
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 既定のログイン画面のルート
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// URL として解釈できない
    #[error("SCHOOLFEE_API_URL が不正です: {value:?}: {source}")]
    InvalidUrl {
        value:  String,
        #[source]
        source: url::ParseError,
    },

    /// http / https 以外のスキーム
    #[error("SCHOOLFEE_API_URL は http または https である必要があります: {0}")]
    UnsupportedScheme(String),

    /// タイムアウトが正の整数でない
    #[error("SCHOOLFEE_TIMEOUT_SECS は 1 以上の整数である必要があります: {0:?}")]
    InvalidTimeout(String),

    /// HTTP クライアントを構築できない
    #[error("HTTP クライアントを構築できません: {0}")]
    HttpClient(String),
}

/// HTTP クライアントの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// バックエンドのベース URL（例: `https://fees.example.com/api`）
    pub base_url:    Url,
    /// リクエストのタイムアウト
    pub timeout:     Duration,
    /// セッション切れ時に通知するログイン画面のルート
    pub login_route: String,
    /// `User-Agent` ヘッダー
    pub user_agent:  String,
}

impl ClientConfig {
    /// ベース URL を指定して作成する（その他は既定値）
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url:    parse_base_url(base_url)?,
            timeout:     DEFAULT_TIMEOUT,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            user_agent:  format!("schoolfee-client/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_login_route(mut self, login_route: impl Into<String>) -> Self {
        self.login_route = login_route.into();
        self
    }

    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("SCHOOLFEE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = lookup("SCHOOLFEE_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(route) = lookup("SCHOOLFEE_LOGIN_ROUTE").filter(|r| !r.trim().is_empty()) {
            config.login_route = route;
        }

        Ok(config)
    }

    /// パスを連結した URL 文字列を返す
    pub(crate) fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
        value: value.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_未設定なら既定値を使う() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.base_url.as_str(), "http://localhost:5000/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.login_route, "/login");
    }

    #[test]
    fn test_環境変数で上書きできる() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SCHOOLFEE_API_URL", "https://fees.example.com/api/"),
            ("SCHOOLFEE_TIMEOUT_SECS", "5"),
            ("SCHOOLFEE_LOGIN_ROUTE", "/auth/sign-in"),
        ]))
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.login_route, "/auth/sign-in");
        assert_eq!(
            config.endpoint("/students"),
            "https://fees.example.com/api/students"
        );
    }

    #[rstest]
    #[case("0")]
    #[case("-1")]
    #[case("thirty")]
    fn test_不正なタイムアウトはエラー(#[case] value: &str) {
        let result = ClientConfig::from_lookup(lookup(&[("SCHOOLFEE_TIMEOUT_SECS", value)]));

        assert!(matches!(result, Err(ConfigError::InvalidTimeout(v)) if v == value));
    }

    #[test]
    fn test_不正なurlはエラー() {
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::new("ftp://example.com"),
            Err(ConfigError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[rstest]
    #[case("http://localhost:5000/api", "/payments/1", "http://localhost:5000/api/payments/1")]
    #[case("http://localhost:5000/api/", "payments", "http://localhost:5000/api/payments")]
    #[case("http://localhost:5000", "/auth/me", "http://localhost:5000/auth/me")]
    fn test_endpointはスラッシュを1つにまとめる(
        #[case] base: &str,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        let config = ClientConfig::new(base).unwrap();

        assert_eq!(config.endpoint(path), expected);
    }
}
