//! 支払い API

use async_trait::async_trait;
use reqwest::Method;
use schoolfee_domain::payment::{NewPayment, Payment, PaymentFilter, PaymentId, VoidPayment};
use schoolfee_shared::{ApiResponse, Page};

use super::{list_response, record_response, segment};
use crate::{
    error::ClientError,
    http::{ApiClient, RequestConfig},
    transfer::Download,
};

/// 支払い API トレイト
#[async_trait]
pub trait PaymentsApi: Send + Sync {
    /// 支払い一覧を取得する
    ///
    /// `GET /payments` を呼び出す。
    async fn list_payments(
        &self,
        filter: &PaymentFilter,
    ) -> Result<ApiResponse<Page<Payment>>, ClientError>;

    /// 支払いを取得する
    ///
    /// `GET /payments/{id}` を呼び出す。
    async fn get_payment(&self, id: PaymentId) -> Result<ApiResponse<Payment>, ClientError>;

    /// 支払いを記録する
    ///
    /// `POST /payments` を呼び出す。
    async fn record_payment(
        &self,
        input: &NewPayment,
    ) -> Result<ApiResponse<Payment>, ClientError>;

    /// 支払いを取り消す
    ///
    /// `POST /payments/{id}/void` を呼び出す。
    async fn void_payment(
        &self,
        id: PaymentId,
        input: &VoidPayment,
    ) -> Result<ApiResponse<Payment>, ClientError>;

    /// 領収書をダウンロードする
    ///
    /// `GET /payments/receipt/{id}` を呼び出す。
    async fn download_receipt(&self, id: PaymentId) -> Result<Download, ClientError>;
}

#[async_trait]
impl PaymentsApi for ApiClient {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_payments(
        &self,
        filter: &PaymentFilter,
    ) -> Result<ApiResponse<Page<Payment>>, ClientError> {
        let config = RequestConfig::new().with_query(filter.to_query());
        let body = self
            .request_value(Method::GET, "/payments", None, &config)
            .await?;
        list_response(body)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn get_payment(&self, id: PaymentId) -> Result<ApiResponse<Payment>, ClientError> {
        let path = format!("/payments/{}", segment(id));
        let body = self
            .request_value(Method::GET, &path, None, &RequestConfig::new())
            .await?;
        record_response(body, "payment")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(student_id = %input.student_id))]
    async fn record_payment(
        &self,
        input: &NewPayment,
    ) -> Result<ApiResponse<Payment>, ClientError> {
        let payload = serde_json::to_value(input)?;
        let body = self
            .request_value(Method::POST, "/payments", Some(&payload), &RequestConfig::new())
            .await?;
        record_response(body, "payment")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn void_payment(
        &self,
        id: PaymentId,
        input: &VoidPayment,
    ) -> Result<ApiResponse<Payment>, ClientError> {
        let path = format!("/payments/{}/void", segment(id));
        let payload = serde_json::to_value(input)?;
        let body = self
            .request_value(Method::POST, &path, Some(&payload), &RequestConfig::new())
            .await?;
        record_response(body, "payment")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn download_receipt(&self, id: PaymentId) -> Result<Download, ClientError> {
        let path = format!("/payments/receipt/{}", segment(id));
        self.download(&path, &RequestConfig::new()).await
    }
}
