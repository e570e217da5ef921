//! 費目 API

use async_trait::async_trait;
use reqwest::Method;
use schoolfee_domain::{
    class::ClassId,
    fee::{
        AssignFee,
        AssignmentFilter,
        AssignmentOutcome,
        FeeAssignment,
        FeeStructure,
        FeeStructureId,
        NewFeeStructure,
    },
};
use schoolfee_shared::{ApiResponse, Page};

use super::{list_response, record_response, segment, unit_response};
use crate::{
    error::ClientError,
    http::{ApiClient, RequestConfig},
};

/// 費目 API トレイト
#[async_trait]
pub trait FeeStructuresApi: Send + Sync {
    /// 費目一覧を取得する
    ///
    /// `GET /fee-structures` を呼び出す。`class_id` を指定するとそのクラスの費目に絞る。
    async fn list_fee_structures(
        &self,
        class_id: Option<ClassId>,
    ) -> Result<ApiResponse<Page<FeeStructure>>, ClientError>;

    /// 費目を取得する
    ///
    /// `GET /fee-structures/{id}` を呼び出す。
    async fn get_fee_structure(
        &self,
        id: FeeStructureId,
    ) -> Result<ApiResponse<FeeStructure>, ClientError>;

    /// 費目を登録する
    ///
    /// `POST /fee-structures` を呼び出す。
    async fn create_fee_structure(
        &self,
        input: &NewFeeStructure,
    ) -> Result<ApiResponse<FeeStructure>, ClientError>;

    /// 費目を更新する
    ///
    /// `PUT /fee-structures/{id}` を呼び出す。
    async fn update_fee_structure(
        &self,
        id: FeeStructureId,
        input: &NewFeeStructure,
    ) -> Result<ApiResponse<FeeStructure>, ClientError>;

    /// 費目を削除する
    ///
    /// `DELETE /fee-structures/{id}` を呼び出す。
    async fn delete_fee_structure(
        &self,
        id: FeeStructureId,
    ) -> Result<ApiResponse<()>, ClientError>;

    /// 費目を生徒またはクラスに割り当てる
    ///
    /// `POST /fee-structures/{id}/assign` を呼び出す。
    async fn assign_fee(
        &self,
        id: FeeStructureId,
        input: &AssignFee,
    ) -> Result<ApiResponse<AssignmentOutcome>, ClientError>;

    /// 割り当て一覧を取得する
    ///
    /// `GET /fee-structures/assignments` を呼び出す。
    async fn list_assignments(
        &self,
        filter: &AssignmentFilter,
    ) -> Result<ApiResponse<Page<FeeAssignment>>, ClientError>;
}

#[async_trait]
impl FeeStructuresApi for ApiClient {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_fee_structures(
        &self,
        class_id: Option<ClassId>,
    ) -> Result<ApiResponse<Page<FeeStructure>>, ClientError> {
        let mut config = RequestConfig::new();
        if let Some(class_id) = class_id {
            config = config.query("class_id", class_id);
        }
        let body = self
            .request_value(Method::GET, "/fee-structures", None, &config)
            .await?;
        list_response(body)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn get_fee_structure(
        &self,
        id: FeeStructureId,
    ) -> Result<ApiResponse<FeeStructure>, ClientError> {
        let path = format!("/fee-structures/{}", segment(id));
        let body = self
            .request_value(Method::GET, &path, None, &RequestConfig::new())
            .await?;
        record_response(body, "fee_structure")
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn create_fee_structure(
        &self,
        input: &NewFeeStructure,
    ) -> Result<ApiResponse<FeeStructure>, ClientError> {
        let payload = serde_json::to_value(input)?;
        let body = self
            .request_value(
                Method::POST,
                "/fee-structures",
                Some(&payload),
                &RequestConfig::new(),
            )
            .await?;
        record_response(body, "fee_structure")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn update_fee_structure(
        &self,
        id: FeeStructureId,
        input: &NewFeeStructure,
    ) -> Result<ApiResponse<FeeStructure>, ClientError> {
        let path = format!("/fee-structures/{}", segment(id));
        let payload = serde_json::to_value(input)?;
        let body = self
            .request_value(Method::PUT, &path, Some(&payload), &RequestConfig::new())
            .await?;
        record_response(body, "fee_structure")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete_fee_structure(
        &self,
        id: FeeStructureId,
    ) -> Result<ApiResponse<()>, ClientError> {
        let path = format!("/fee-structures/{}", segment(id));
        let body = self
            .request_value(Method::DELETE, &path, None, &RequestConfig::new())
            .await?;
        Ok(unit_response(body))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn assign_fee(
        &self,
        id: FeeStructureId,
        input: &AssignFee,
    ) -> Result<ApiResponse<AssignmentOutcome>, ClientError> {
        let path = format!("/fee-structures/{}/assign", segment(id));
        let payload = serde_json::to_value(input)?;
        let body = self
            .request_value(Method::POST, &path, Some(&payload), &RequestConfig::new())
            .await?;
        record_response(body, "result")
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_assignments(
        &self,
        filter: &AssignmentFilter,
    ) -> Result<ApiResponse<Page<FeeAssignment>>, ClientError> {
        let config = RequestConfig::new().with_query(filter.to_query());
        let body = self
            .request_value(Method::GET, "/fee-structures/assignments", None, &config)
            .await?;
        list_response(body)
    }
}
