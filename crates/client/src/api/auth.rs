//! 認証 API

use async_trait::async_trait;
use reqwest::Method;
use schoolfee_domain::auth::{AuthUser, LoginCredentials, TokenResponse};
use schoolfee_shared::ApiResponse;

use super::{record_response, unit_response};
use crate::{
    error::ClientError,
    http::{ApiClient, LOGIN_PATH, RequestConfig},
};

/// 認証 API トレイト
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// ログインしてトークンを保存する
    ///
    /// `POST /auth/login` を呼び出す。応答にユーザー情報があれば返す。
    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<ApiResponse<Option<AuthUser>>, ClientError>;

    /// ログアウトする
    ///
    /// `POST /auth/logout` を呼び出す。呼び出しが失敗してもトークンは破棄する。
    async fn logout(&self) -> Result<(), ClientError>;

    /// ログイン中のユーザーを取得する
    ///
    /// `GET /auth/me` を呼び出す。
    async fn me(&self) -> Result<ApiResponse<AuthUser>, ClientError>;
}

#[async_trait]
impl AuthApi for ApiClient {
    #[tracing::instrument(skip_all, level = "debug", fields(email = %credentials.email))]
    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<ApiResponse<Option<AuthUser>>, ClientError> {
        let body = serde_json::to_value(credentials)?;
        let response = self
            .request_value(Method::POST, LOGIN_PATH, Some(&body), &RequestConfig::new())
            .await?;

        let response = record_response::<TokenResponse>(response, "tokens")?;
        let user = response.data.user.clone();
        self.token_store()
            .set(response.data.clone().into_pair(None))
            .await?;

        tracing::info!("ログインしました");
        Ok(response.map(|_| user))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .request_value(Method::POST, "/auth/logout", None, &RequestConfig::new())
            .await
            .map(unit_response);

        self.token_store().clear().await?;
        result.map(|_| ())
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn me(&self) -> Result<ApiResponse<AuthUser>, ClientError> {
        let body = self
            .request_value(Method::GET, "/auth/me", None, &RequestConfig::new())
            .await?;
        record_response(body, "user")
    }
}
