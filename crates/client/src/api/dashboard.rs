//! ダッシュボード API

use async_trait::async_trait;
use reqwest::Method;
use schoolfee_domain::{
    dashboard::{DashboardStats, MonthlyCollection},
    payment::Payment,
};
use schoolfee_shared::{ApiResponse, Page};

use super::{list_response, record_response};
use crate::{
    error::ClientError,
    http::{ApiClient, RequestConfig},
};

/// ダッシュボード API トレイト
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// 集計値を取得する
    ///
    /// `GET /dashboard/stats` を呼び出す。
    async fn dashboard_stats(&self) -> Result<ApiResponse<DashboardStats>, ClientError>;

    /// 最近の支払いを取得する
    ///
    /// `GET /dashboard/recent-payments` を呼び出す。
    async fn recent_payments(
        &self,
        limit: u32,
    ) -> Result<ApiResponse<Page<Payment>>, ClientError>;

    /// 月次の徴収額推移を取得する
    ///
    /// `GET /dashboard/collection-trend` を呼び出す。
    async fn collection_trend(
        &self,
        months: Option<u32>,
    ) -> Result<ApiResponse<Page<MonthlyCollection>>, ClientError>;
}

#[async_trait]
impl DashboardApi for ApiClient {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn dashboard_stats(&self) -> Result<ApiResponse<DashboardStats>, ClientError> {
        let body = self
            .request_value(Method::GET, "/dashboard/stats", None, &RequestConfig::new())
            .await?;
        record_response(body, "stats")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%limit))]
    async fn recent_payments(
        &self,
        limit: u32,
    ) -> Result<ApiResponse<Page<Payment>>, ClientError> {
        let config = RequestConfig::new().query("limit", limit.max(1));
        let body = self
            .request_value(Method::GET, "/dashboard/recent-payments", None, &config)
            .await?;
        list_response(body)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn collection_trend(
        &self,
        months: Option<u32>,
    ) -> Result<ApiResponse<Page<MonthlyCollection>>, ClientError> {
        let mut config = RequestConfig::new();
        if let Some(months) = months {
            config = config.query("months", months);
        }
        let body = self
            .request_value(Method::GET, "/dashboard/collection-trend", None, &config)
            .await?;
        list_response(body)
    }
}
