//! 保護者ポータル API

use async_trait::async_trait;
use reqwest::Method;
use schoolfee_domain::{
    fee::FeeAssignment,
    parent::{CHILD_FEES_KEY, ChildSummary},
    payment::{Payment, PaymentId},
    student::StudentId,
};
use schoolfee_shared::{ApiResponse, Page, PageRequest};

use super::{keyed_list_response, list_response, segment};
use crate::{
    error::ClientError,
    http::{ApiClient, RequestConfig},
    transfer::Download,
};

/// 保護者ポータル API トレイト
#[async_trait]
pub trait ParentPortalApi: Send + Sync {
    /// 子ども一覧を取得する
    ///
    /// `GET /parent/children` を呼び出す。
    async fn list_children(&self) -> Result<ApiResponse<Page<ChildSummary>>, ClientError>;

    /// 子どもの費目一覧を取得する
    ///
    /// `GET /parent/children/{id}/fees` を呼び出す。
    async fn child_fees(
        &self,
        student_id: StudentId,
    ) -> Result<ApiResponse<Page<FeeAssignment>>, ClientError>;

    /// 保護者の支払い履歴を取得する
    ///
    /// `GET /parent/payments` を呼び出す。
    async fn parent_payments(
        &self,
        page: PageRequest,
    ) -> Result<ApiResponse<Page<Payment>>, ClientError>;

    /// 領収書をダウンロードする
    ///
    /// `GET /parent/payments/{id}/receipt` を呼び出す。
    async fn parent_receipt(&self, id: PaymentId) -> Result<Download, ClientError>;
}

#[async_trait]
impl ParentPortalApi for ApiClient {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_children(&self) -> Result<ApiResponse<Page<ChildSummary>>, ClientError> {
        let body = self
            .request_value(Method::GET, "/parent/children", None, &RequestConfig::new())
            .await?;
        list_response(body)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%student_id))]
    async fn child_fees(
        &self,
        student_id: StudentId,
    ) -> Result<ApiResponse<Page<FeeAssignment>>, ClientError> {
        let path = format!("/parent/children/{}/fees", segment(student_id));
        let body = self
            .request_value(Method::GET, &path, None, &RequestConfig::new())
            .await?;
        keyed_list_response(body, CHILD_FEES_KEY)
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn parent_payments(
        &self,
        page: PageRequest,
    ) -> Result<ApiResponse<Page<Payment>>, ClientError> {
        let config = RequestConfig::new()
            .with_query(page.to_query().map(|(k, v)| (k.to_string(), v)));
        let body = self
            .request_value(Method::GET, "/parent/payments", None, &config)
            .await?;
        list_response(body)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn parent_receipt(&self, id: PaymentId) -> Result<Download, ClientError> {
        let path = format!("/parent/payments/{}/receipt", segment(id));
        self.download(&path, &RequestConfig::new()).await
    }
}
