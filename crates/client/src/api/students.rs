//! 生徒 API

use async_trait::async_trait;
use reqwest::Method;
use schoolfee_domain::{
    DomainError,
    student::{NewStudent, Student, StudentFilter, StudentId, StudentImportResult, StudentUpdate},
};
use schoolfee_shared::{ApiResponse, Page};

use super::{list_response, record_response, segment, unit_response};
use crate::{
    error::ClientError,
    http::{ApiClient, RequestConfig},
    transfer::{ProgressFn, UploadFile},
};

/// 生徒 API トレイト
#[async_trait]
pub trait StudentsApi: Send + Sync {
    /// 生徒一覧を取得する
    ///
    /// `GET /students` を呼び出す。
    async fn list_students(
        &self,
        filter: &StudentFilter,
    ) -> Result<ApiResponse<Page<Student>>, ClientError>;

    /// 生徒を取得する
    ///
    /// `GET /students/{id}` を呼び出す。
    async fn get_student(&self, id: StudentId) -> Result<ApiResponse<Student>, ClientError>;

    /// 生徒を登録する
    ///
    /// `POST /students` を呼び出す。
    async fn create_student(
        &self,
        input: &NewStudent,
    ) -> Result<ApiResponse<Student>, ClientError>;

    /// 生徒情報を更新する
    ///
    /// `PUT /students/{id}` を呼び出す。更新項目が無い場合は送信せずエラーにする。
    async fn update_student(
        &self,
        id: StudentId,
        input: &StudentUpdate,
    ) -> Result<ApiResponse<Student>, ClientError>;

    /// 生徒を削除する
    ///
    /// `DELETE /students/{id}` を呼び出す。
    async fn delete_student(&self, id: StudentId) -> Result<ApiResponse<()>, ClientError>;

    /// 生徒を一括で取り込む
    ///
    /// `POST /students/import` に multipart でファイルを送る。
    async fn import_students(
        &self,
        file: &UploadFile,
        progress: Option<ProgressFn>,
    ) -> Result<ApiResponse<StudentImportResult>, ClientError>;
}

#[async_trait]
impl StudentsApi for ApiClient {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn list_students(
        &self,
        filter: &StudentFilter,
    ) -> Result<ApiResponse<Page<Student>>, ClientError> {
        let config = RequestConfig::new().with_query(filter.to_query());
        let body = self
            .request_value(Method::GET, "/students", None, &config)
            .await?;
        list_response(body)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn get_student(&self, id: StudentId) -> Result<ApiResponse<Student>, ClientError> {
        let path = format!("/students/{}", segment(id));
        let body = self
            .request_value(Method::GET, &path, None, &RequestConfig::new())
            .await?;
        record_response(body, "student")
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn create_student(
        &self,
        input: &NewStudent,
    ) -> Result<ApiResponse<Student>, ClientError> {
        let payload = serde_json::to_value(input)?;
        let body = self
            .request_value(Method::POST, "/students", Some(&payload), &RequestConfig::new())
            .await?;
        record_response(body, "student")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn update_student(
        &self,
        id: StudentId,
        input: &StudentUpdate,
    ) -> Result<ApiResponse<Student>, ClientError> {
        if input.is_empty() {
            return Err(DomainError::Validation("更新する項目がありません".to_string()).into());
        }
        let path = format!("/students/{}", segment(id));
        let payload = serde_json::to_value(input)?;
        let body = self
            .request_value(Method::PUT, &path, Some(&payload), &RequestConfig::new())
            .await?;
        record_response(body, "student")
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete_student(&self, id: StudentId) -> Result<ApiResponse<()>, ClientError> {
        let path = format!("/students/{}", segment(id));
        let body = self
            .request_value(Method::DELETE, &path, None, &RequestConfig::new())
            .await?;
        Ok(unit_response(body))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(file_name = %file.file_name))]
    async fn import_students(
        &self,
        file: &UploadFile,
        progress: Option<ProgressFn>,
    ) -> Result<ApiResponse<StudentImportResult>, ClientError> {
        let response = self
            .upload::<serde_json::Value>("/students/import", file, progress, &RequestConfig::new())
            .await?;
        response.try_map(|data| record_response(data, "result").map(|r| r.data))
    }
}
