//! # 認証
//!
//! ログイン入力、ログイン応答、トークンの組、ログイン中のユーザーを定義する。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    value_objects::{Email, Password},
};

define_id! {
    /// ユーザー ID
    pub struct UserId;
}

/// ユーザーの役割
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    Admin,
    Accountant,
    Teacher,
    Parent,
    /// 未知の役割
    #[serde(other)]
    Other,
}

/// ログイン中のユーザー（`GET /auth/me`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id:    UserId,
    pub email: String,
    #[serde(default)]
    pub name:  Option<String>,
    pub role:  UserRole,
}

impl AuthUser {
    pub fn is_parent(&self) -> bool {
        self.role == UserRole::Parent
    }
}

/// ログイン入力
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    pub email:    Email,
    pub password: Password,
}

impl LoginCredentials {
    /// # エラー
    ///
    /// メールアドレスの形式が不正、またはパスワードが空の場合
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            email:    Email::new(email)?,
            password: Password::new(password)?,
        })
    }
}

/// アクセストークンとリフレッシュトークンの組
///
/// ログインで作成され、リフレッシュで置き換えられ、ログアウトまたは
/// 回復不能な 401 で削除される。
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token:  String,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// トークンを含む応答（`POST /auth/login`・`POST /auth/refresh`）
///
/// トークンのキー名はエンドポイントによって揺れるため、別名をまとめて受け付ける。
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(alias = "access_token", alias = "accessToken")]
    pub token:         String,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user:          Option<AuthUser>,
}

impl TokenResponse {
    /// トークンの組に変換する
    ///
    /// 応答にリフレッシュトークンが無ければ `previous_refresh` を引き継ぐ。
    pub fn into_pair(self, previous_refresh: Option<String>) -> TokenPair {
        TokenPair::new(self.token, self.refresh_token.or(previous_refresh))
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
