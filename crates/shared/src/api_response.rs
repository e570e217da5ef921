//! # API レスポンスエンベロープ
//!
//! バックエンドの成功レスポンス `{ "success": bool, "data": T, "message"?, "error"? }` を表す。
//!
//! バックエンドはエンドポイントごとにエンベロープの有無が揃っていないため、
//! [`ApiResponse::from_body`] で任意の JSON ボディを一律にこの形へ寄せる。

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// 成功レスポンスの統一型
///
/// HTTP クライアントはすべての 2xx レスポンスをこの型で返す。
/// `data` の中身の解釈（一覧かレコードか）はリソース API モジュールの責務。
///
/// ## 使用例
///
/// ```
/// use schoolfee_shared::ApiResponse;
///
/// let response = ApiResponse::new("hello");
/// assert!(response.success);
/// assert_eq!(response.data, "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data:    T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error:   Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    /// 新しい成功レスポンスを作成する
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
            error: None,
        }
    }

    /// `data` だけを変換する（`success` / `message` / `error` は引き継ぐ）
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data:    f(self.data),
            message: self.message,
            error:   self.error,
        }
    }

    /// `data` の変換が失敗しうる場合の [`map`](Self::map)
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<ApiResponse<U>, E> {
        Ok(ApiResponse {
            success: self.success,
            data:    f(self.data)?,
            message: self.message,
            error:   self.error,
        })
    }
}

impl ApiResponse<Value> {
    /// 任意の JSON ボディからエンベロープを組み立てる
    ///
    /// - `success` か `data` を持つオブジェクトはエンベロープとして解釈する。
    ///   `data` が無い場合は `success` / `message` / `error` を除いた残りを `data` とする
    /// - それ以外（配列、エンベロープを持たないオブジェクト、空ボディ）は
    ///   `{ success: true, data: <body> }` として包む
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(mut map) if map.contains_key("success") || map.contains_key("data") => {
                let success = map
                    .remove("success")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                let message = take_text(&mut map, "message");
                let error = take_text(&mut map, "error");
                let data = match map.remove("data") {
                    Some(data) => data,
                    None if map.is_empty() => Value::Null,
                    None => Value::Object(map),
                };
                Self {
                    success,
                    data,
                    message,
                    error,
                }
            }
            other => Self::new(other),
        }
    }

    /// `data` を型付きで解釈する
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, serde_json::Error> {
        self.try_map(serde_json::from_value)
    }
}

/// 文字列フィールドを取り出す
///
/// `error` はオブジェクトで返ることがあるため、その場合は `message` を採用する。
fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        other => Some(other.to_string()),
    }
}
