//! 学校設定 API

use async_trait::async_trait;
use reqwest::Method;
use schoolfee_domain::settings::SchoolSettings;
use schoolfee_shared::ApiResponse;

use super::record_response;
use crate::{
    error::ClientError,
    http::{ApiClient, RequestConfig},
};

const SETTINGS_PATH: &str = "/settings/school";

/// 学校設定 API トレイト
#[async_trait]
pub trait SettingsApi: Send + Sync {
    /// 学校設定を取得する
    ///
    /// `GET /settings/school` を呼び出す。
    async fn get_settings(&self) -> Result<ApiResponse<SchoolSettings>, ClientError>;

    /// 学校設定を更新する
    ///
    /// `PUT /settings/school` を呼び出す。送信前に学校名とメールアドレスを検証する。
    async fn update_settings(
        &self,
        settings: SchoolSettings,
    ) -> Result<ApiResponse<SchoolSettings>, ClientError>;
}

#[async_trait]
impl SettingsApi for ApiClient {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn get_settings(&self) -> Result<ApiResponse<SchoolSettings>, ClientError> {
        let body = self
            .request_value(Method::GET, SETTINGS_PATH, None, &RequestConfig::new())
            .await?;
        record_response(body, "settings")
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn update_settings(
        &self,
        settings: SchoolSettings,
    ) -> Result<ApiResponse<SchoolSettings>, ClientError> {
        let payload = serde_json::to_value(settings.validated()?)?;
        let body = self
            .request_value(Method::PUT, SETTINGS_PATH, Some(&payload), &RequestConfig::new())
            .await?;
        record_response(body, "settings")
    }
}
