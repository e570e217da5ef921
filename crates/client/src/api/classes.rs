//! クラス API

use async_trait::async_trait;
use reqwest::Method;
use schoolfee_domain::{
    class::{ClassId, NewClass, SchoolClass},
    student::Student,
};
use schoolfee_shared::{ApiResponse, Page};

use super::{list_response, record_response, segment, unit_response};
use crate::{
    error::ClientError,
    http::{ApiClient, RequestConfig},
};

/// クラス API トレイト
#[async_trait]
pub trait ClassesApi: Send + Sync {
    /// クラス一覧を取得する
    ///
    /// `GET /classes` を呼び出す。
    async fn list_classes(&self) -> Result<ApiResponse<Page<SchoolClass>>, ClientError>;

    /// クラスを取得する
    ///
    /// `GET /classes/{id}` を呼び出す。
    async fn get_class(&self, id: ClassId) -> Result<ApiResponse<SchoolClass>, ClientError>;

    /// クラスを登録する
    ///
    /// `POST /classes` を呼び出す。
    async fn create_class(
        &self,
        input: &NewClass,
    ) -> Result<ApiResponse<SchoolClass>, ClientError>;

    /// クラスを更新する
    ///
    /// `PUT /classes/{id}` を呼び出す。
    async fn update_class(
        &self,
        id: ClassId,
        input: &NewClass,
    ) -> Result<ApiResponse<SchoolClass>, ClientError>;

    /// クラスを削除する
    ///
    /// `DELETE /classes/{id}` を呼び出す。
    async fn delete_class(&self, id: ClassId) -> Result<ApiResponse<()>, ClientError>;

    /// クラスに所属する生徒一覧を取得する
    ///
    /// `GET /classes/{id}/students` を呼び出す。
    async fn list_class_students(
        &self,
        id: ClassId,
    ) -> Result<ApiResponse<Page<Student>>, ClientError>;
}

#[async_trait]
impl ClassesApi for ApiClient {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_classes(&self) -> Result<ApiResponse<Page<SchoolClass>>, ClientError> {
        let body = self
            .request_value(Method::GET, "/classes", None, &RequestConfig::new())
            .await?;
        list_response(body)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn get_class(&self, id: ClassId) -> Result<ApiResponse<SchoolClass>, ClientError> {
        let path = format!("/classes/{}", segment(id));
        let body = self
            .request_value(Method::GET, &path, None, &RequestConfig::new())
            .await?;
        record_response(body, "class")
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn create_class(
        &self,
        input: &NewClass,
    ) -> Result<ApiResponse<SchoolClass>, ClientError> {
        let payload = serde_json::to_value(input)?;
        let body = self
            .request_value(Method::POST, "/classes", Some(&payload), &RequestConfig::new())
            .await?;
        record_response(body, "class")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn update_class(
        &self,
        id: ClassId,
        input: &NewClass,
    ) -> Result<ApiResponse<SchoolClass>, ClientError> {
        let path = format!("/classes/{}", segment(id));
        let payload = serde_json::to_value(input)?;
        let body = self
            .request_value(Method::PUT, &path, Some(&payload), &RequestConfig::new())
            .await?;
        record_response(body, "class")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete_class(&self, id: ClassId) -> Result<ApiResponse<()>, ClientError> {
        let path = format!("/classes/{}", segment(id));
        let body = self
            .request_value(Method::DELETE, &path, None, &RequestConfig::new())
            .await?;
        Ok(unit_response(body))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn list_class_students(
        &self,
        id: ClassId,
    ) -> Result<ApiResponse<Page<Student>>, ClientError> {
        let path = format!("/classes/{}/students", segment(id));
        let body = self
            .request_value(Method::GET, &path, None, &RequestConfig::new())
            .await?;
        list_response(body)
    }
}
