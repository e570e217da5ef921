//! # クライアントエラー
//!
//! HTTP クライアントとリソース API が返すエラーを定義する。
//!
//! どの失敗も [`ClientError::to_api_error`] で `{ message, code?, details?, statusCode }` の
//! 一つの形に揃えられる。画面側はこの形だけを扱えばよい。

use std::collections::BTreeMap;

use schoolfee_domain::DomainError;
use schoolfee_shared::{ApiError, DecodeError, api_error::NO_STATUS};
use thiserror::Error;

use crate::{config::ConfigError, token_store::TokenStoreError};

/// クライアントエラー
#[derive(Debug, Error)]
pub enum ClientError {
    /// 非 2xx レスポンスまたはネットワークエラー（正規化済み）
    #[error("{0}")]
    Api(ApiError),

    /// リフレッシュに失敗し、トークンを破棄した
    #[error("セッションの有効期限が切れました")]
    SessionExpired,

    /// 送信前の入力検証エラー
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// 一覧・レコードの形状を解釈できない
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// 2xx レスポンスのボディを解釈できない
    #[error("レスポンスボディを解釈できません: {0}")]
    Body(#[from] serde_json::Error),

    /// トークンの読み書きに失敗
    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    /// 設定エラー
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// ダウンロードしたファイルの保存に失敗
    #[error("ファイルを保存できません: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// 正規化済みエラーに変換する
    ///
    /// | バリアント | statusCode | code |
    /// |-----------|-----------|------|
    /// | `Api` | レスポンスのステータス（ネットワークは 0） | ボディの値 |
    /// | `SessionExpired` | 401 | `SESSION_EXPIRED` |
    /// | `Validation` | 400 | `VALIDATION_ERROR` |
    /// | `Decode` / `Body` | 0 | `DECODE_ERROR` |
    /// | その他 | 0 | 種類ごとのコード |
    pub fn to_api_error(&self) -> ApiError {
        match self {
            ClientError::Api(error) => error.clone(),
            ClientError::SessionExpired => {
                ApiError::new(401, "Session expired. Please log in again.")
                    .with_code("SESSION_EXPIRED")
            }
            ClientError::Validation(error) => ApiError::validation(error.message()),
            ClientError::Decode(error) => ApiError::decode(error),
            ClientError::Body(error) => ApiError::decode(error),
            ClientError::TokenStore(error) => {
                ApiError::new(NO_STATUS, error.to_string()).with_code("TOKEN_STORE_ERROR")
            }
            ClientError::Config(error) => {
                ApiError::new(NO_STATUS, error.to_string()).with_code("CONFIG_ERROR")
            }
            ClientError::Io(error) => {
                ApiError::new(NO_STATUS, error.to_string()).with_code("IO_ERROR")
            }
        }
    }

    /// HTTP ステータス（レスポンスが無ければ 0）
    pub fn status_code(&self) -> u16 {
        self.to_api_error().status_code
    }

    /// フィールド名 → メッセージの対応（入力欄ごとのエラー表示用）
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        match self {
            ClientError::Api(error) => error.field_errors(),
            _ => BTreeMap::new(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired)
    }
}

impl From<ApiError> for ClientError {
    fn from(error: ApiError) -> Self {
        ClientError::Api(error)
    }
}
