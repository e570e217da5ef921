//! # リソース API
//!
//! バックエンドのリソースごとに 1 つのトレイトを定義し、[`ApiClient`](crate::http::ApiClient) に実装する。
//!
//! 各メソッドは REST エンドポイントと 1 対 1 に対応する。行うのはパラメータの受け渡し、
//! ドメイン型のコンストラクタで検証済みの入力の送信、レスポンスのデコードだけである。
//!
//! | トレイト | パス |
//! |---------|------|
//! | [`AuthApi`] | `/auth/*` |
//! | [`StudentsApi`] | `/students` |
//! | [`ClassesApi`] | `/classes` |
//! | [`FeeStructuresApi`] | `/fee-structures` |
//! | [`PaymentsApi`] | `/payments` |
//! | [`ReportsApi`] | `/reports/*` |
//! | [`DashboardApi`] | `/dashboard/*` |
//! | [`SettingsApi`] | `/settings/school` |
//! | [`ParentPortalApi`] | `/parent/*` |

mod auth;
mod classes;
mod dashboard;
mod fee_structures;
mod parent_portal;
mod payments;
mod reports;
mod settings;
mod students;

use std::fmt::Display;

pub use auth::AuthApi;
pub use classes::ClassesApi;
pub use dashboard::DashboardApi;
pub use fee_structures::FeeStructuresApi;
pub use parent_portal::ParentPortalApi;
pub use payments::PaymentsApi;
pub use reports::ReportsApi;
use schoolfee_shared::{ApiResponse, ListResource, Page, decode_list, decode_page, decode_record};
use serde::de::DeserializeOwned;
use serde_json::Value;
pub use settings::SettingsApi;
pub use students::StudentsApi;

use crate::error::ClientError;

/// 学費管理 API クライアントトレイト（スーパートレイト）
///
/// 各リソースのトレイトを束ねる。テスト時にはリソース単位でスタブを使用できる。
pub trait SchoolFeeApi:
    AuthApi
    + StudentsApi
    + ClassesApi
    + FeeStructuresApi
    + PaymentsApi
    + ReportsApi
    + DashboardApi
    + SettingsApi
    + ParentPortalApi
{
}

/// ブランケット impl: すべてのリソーストレイトを実装する型は
/// 自動的に `SchoolFeeApi` を実装する。
impl<T> SchoolFeeApi for T where
    T: AuthApi
        + StudentsApi
        + ClassesApi
        + FeeStructuresApi
        + PaymentsApi
        + ReportsApi
        + DashboardApi
        + SettingsApi
        + ParentPortalApi
{
}

/// [`ListResource`] の一覧キーでデコードする
fn list_response<T: ListResource>(body: Value) -> Result<ApiResponse<Page<T>>, ClientError> {
    let page = decode_page::<T>(&body)?;
    Ok(ApiResponse::from_body(body).map(|_| page))
}

/// 任意の一覧キーでデコードする
fn keyed_list_response<T: DeserializeOwned>(
    body: Value,
    key: &str,
) -> Result<ApiResponse<Page<T>>, ClientError> {
    let page = decode_list::<T>(&body, key)?;
    Ok(ApiResponse::from_body(body).map(|_| page))
}

/// 単一レコードとしてデコードする
fn record_response<T: DeserializeOwned>(
    body: Value,
    key: &str,
) -> Result<ApiResponse<T>, ClientError> {
    let record = decode_record::<T>(&body, key)?;
    Ok(ApiResponse::from_body(body).map(|_| record))
}

/// `data` を読まない応答（削除など）
fn unit_response(body: Value) -> ApiResponse<()> {
    ApiResponse::from_body(body).map(|_| ())
}

/// パスセグメントとしてエンコードする
fn segment(value: impl Display) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use schoolfee_domain::student::{Student, StudentId};
    use schoolfee_shared::Pagination;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_一覧はエンベロープのメッセージを保ったままデコードされる() {
        let body = json!({
            "success": true,
            "message": "ok",
            "data": [{ "id": 1, "admission_number": "A1", "first_name": "A", "last_name": "B" }],
            "pagination": { "page": 1, "limit": 10, "total": 1 }
        });

        let response = list_response::<Student>(body).unwrap();

        assert_eq!(response.message.as_deref(), Some("ok"));
        assert_eq!(response.data.items[0].id, StudentId::new(1));
        assert_eq!(response.data.pagination, Some(Pagination::new(1, 10, 1)));
    }

    #[test]
    fn test_削除の応答はdataを読まない() {
        let response = unit_response(json!({ "message": "Student deleted" }));

        assert!(response.success);
    }

    #[test]
    fn test_パスセグメントはエンコードされる() {
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
        assert_eq!(segment(StudentId::new(42)), "42");
    }
}
