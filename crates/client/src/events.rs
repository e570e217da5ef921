//! # クライアントイベント
//!
//! HTTP クライアントから利用者への通知（エラーのトースト表示、ログイン画面への遷移）を
//! 抽象化する。
//!
//! - [`ClientEvents::error`]: 401 以外のすべての正規化済みエラーで呼ばれる
//! - [`ClientEvents::session_expired`]: リフレッシュに失敗してトークンを破棄したときに呼ばれる

use std::sync::Mutex;

use schoolfee_shared::ApiError;

/// クライアントイベントの受け手
pub trait ClientEvents: Send + Sync {
    /// 利用者に見せるエラー通知
    fn error(&self, error: &ApiError);

    /// セッション切れ（`login_route` へ遷移させる）
    fn session_expired(&self, login_route: &str);
}

/// tracing にイベントを出力する既定の実装
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl ClientEvents for TracingEvents {
    fn error(&self, error: &ApiError) {
        tracing::warn!(
            status = error.status_code,
            code = error.code.as_deref().unwrap_or("-"),
            category = %error.category(),
            "{}",
            error.message
        );
    }

    fn session_expired(&self, login_route: &str) {
        tracing::info!(login_route, "セッションの有効期限が切れました。再ログインしてください");
    }
}

/// 受け取ったイベントを記録する実装
///
/// テストや、通知を後からまとめて表示したい呼び出し元で使う。
#[derive(Debug, Default)]
pub struct RecordingEvents {
    errors:          Mutex<Vec<ApiError>>,
    session_expired: Mutex<Vec<String>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録済みのエラー通知
    pub fn errors(&self) -> Vec<ApiError> {
        self.errors
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// 記録済みのセッション切れ通知（遷移先ルート）
    pub fn session_expirations(&self) -> Vec<String> {
        self.session_expired
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ClientEvents for RecordingEvents {
    fn error(&self, error: &ApiError) {
        self.errors
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(error.clone());
    }

    fn session_expired(&self, login_route: &str) {
        self.session_expired
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(login_route.to_string());
    }
}
