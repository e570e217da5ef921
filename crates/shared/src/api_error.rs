//! # 正規化済みエラー
//!
//! HTTP クライアントが返すすべての失敗を `{ message, code?, details?, statusCode }` の
//! 一つの形に揃える。
//!
//! ## 設計
//!
//! - `ApiError` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - バックエンドのエラーボディは形が揃っていないため、
//!   [`ApiError::from_response_body`] で寛容に読み取る
//! - レスポンスを受け取れなかった失敗は `statusCode = 0` で表す

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// レスポンスが存在しない失敗（ネットワーク・デコード）に使うステータス
pub const NO_STATUS: u16 = 0;

/// 正規化済みエラー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message:     String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code:        Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details:     Option<Value>,
    pub status_code: u16,
}

/// エラーの分類
///
/// | 分類 | 条件 |
/// |------|------|
/// | `Network` | レスポンスなし（`statusCode = 0`） |
/// | `Unauthorized` | 401 |
/// | `Client` | その他の 4xx |
/// | `Server` | 5xx ほか |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Client,
    Server,
    Unauthorized,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Client => "client",
            ErrorCategory::Server => "server",
            ErrorCategory::Unauthorized => "unauthorized",
        };
        f.write_str(s)
    }
}

impl ApiError {
    /// 汎用コンストラクタ
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
            status_code,
        }
    }

    /// エラーコードを付与する
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// 詳細情報を付与する
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// ネットワークエラー（レスポンスなし）
    pub fn network(cause: impl fmt::Display) -> Self {
        Self::new(NO_STATUS, format!("Network error: {cause}")).with_code("NETWORK_ERROR")
    }

    /// 401 Unauthorized
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message).with_code("UNAUTHORIZED")
    }

    /// 送信前の入力検証エラー
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(400, message).with_code("VALIDATION_ERROR")
    }

    /// 2xx だがボディを解釈できなかった
    pub fn decode(cause: impl fmt::Display) -> Self {
        Self::new(NO_STATUS, format!("Unexpected response: {cause}")).with_code("DECODE_ERROR")
    }

    /// 非 2xx レスポンスのボディからエラーを組み立てる
    ///
    /// 以下の順で読み取り、見つからなければ `"Request failed with status <n>"` とする:
    ///
    /// - message: `message` → `error.message` → `error`（文字列）→ `detail`
    /// - code: `code` → `error.code`
    /// - details: `details` → `error.details` → `errors`
    ///
    /// JSON でないボディ（プロキシの HTML 等）は本文を採用せずフォールバックする。
    pub fn from_response_body(status_code: u16, body: &str) -> Self {
        let fallback = format!("Request failed with status {status_code}");

        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return Self::new(status_code, fallback);
        };

        let nested = value.get("error").filter(|v| v.is_object());

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| nested.and_then(|e| e.get("message")).and_then(Value::as_str))
            .or_else(|| value.get("error").and_then(Value::as_str))
            .or_else(|| value.get("detail").and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty())
            .map_or(fallback, str::to_string);

        let code = value
            .get("code")
            .or_else(|| nested.and_then(|e| e.get("code")))
            .and_then(code_text);

        let details = value
            .get("details")
            .or_else(|| nested.and_then(|e| e.get("details")))
            .or_else(|| value.get("errors"))
            .filter(|v| !v.is_null())
            .cloned();

        Self {
            message,
            code,
            details,
            status_code,
        }
    }

    /// エラーの分類を返す
    pub fn category(&self) -> ErrorCategory {
        match self.status_code {
            NO_STATUS => ErrorCategory::Network,
            401 => ErrorCategory::Unauthorized,
            400..=499 => ErrorCategory::Client,
            _ => ErrorCategory::Server,
        }
    }

    /// 401 かどうか
    pub fn is_unauthorized(&self) -> bool {
        self.category() == ErrorCategory::Unauthorized
    }

    /// `details` をフィールド名 → メッセージの対応に変換する
    ///
    /// 値が配列の場合は先頭の文字列を採用する。オブジェクト以外の `details` は空を返す。
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let Some(Value::Object(map)) = &self.details else {
            return BTreeMap::new();
        };

        map.iter()
            .filter_map(|(field, value)| {
                let message = match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
                    _ => None,
                }?;
                Some((field.clone(), message))
            })
            .collect()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            NO_STATUS => write!(f, "{}", self.message),
            status => write!(f, "[{status}] {}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
