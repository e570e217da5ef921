//! # エラー正規化と共通ヘッダーの統合テスト
//!
//! - 非 2xx のボディの `message` / `code` / `details` がそのまま伝わる
//! - JSON でないボディは `Request failed with status <n>` になる
//! - 4xx / 5xx / ネットワークエラーは通知され、401 は通知されない
//! - すべてのリクエストに `X-Request-Id` と `Authorization` が付く

mod common;

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use common::{
    bearer,
    client_with_tokens,
    logged_in_client,
    spawn_backend,
    unreachable_base_url,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use schoolfee_client::{
    ClientError,
    api::{AuthApi, ClassesApi, DashboardApi},
};
use schoolfee_domain::{
    auth::{LoginCredentials, UserRole},
    class::{ClassId, NewClass},
};
use schoolfee_shared::{ApiError, ErrorCategory};
use serde_json::json;
use uuid::Uuid;

fn error_router() -> Router {
    Router::new()
        .route(
            "/classes",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "success": false,
                        "message": "Validation failed",
                        "code": "VALIDATION_ERROR",
                        "details": { "name": ["Class name already exists"] }
                    })),
                )
            }),
        )
        .route(
            "/classes/{id}",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": { "message": "Class not found", "code": "NOT_FOUND" } })),
                )
            }),
        )
        .route(
            "/dashboard/stats",
            get(|| async { (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>") }),
        )
        .route(
            "/auth/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Invalid credentials" })),
                )
            }),
        )
}

fn api_error<T: std::fmt::Debug>(result: Result<T, ClientError>) -> ApiError {
    match result {
        Err(ClientError::Api(error)) => error,
        other => panic!("ApiError を期待しました: {other:?}"),
    }
}

#[tokio::test]
async fn test_エラーボディのメッセージとコードと詳細が伝わる() {
    let base_url = spawn_backend(error_router()).await;
    let t = logged_in_client(&base_url, "access-1");
    let input = NewClass::new("Grade 4", Some("East".to_string()), None).unwrap();

    let error = api_error(t.client.create_class(&input).await);

    assert_eq!(error.status_code, 422);
    assert_eq!(error.message, "Validation failed");
    assert_eq!(error.code.as_deref(), Some("VALIDATION_ERROR"));
    assert_eq!(error.category(), ErrorCategory::Client);
    assert_eq!(
        error.field_errors().get("name").map(String::as_str),
        Some("Class name already exists")
    );
    assert_eq!(t.events.errors(), vec![error]);
}

#[tokio::test]
async fn test_入れ子のerrorオブジェクトからも読み取る() {
    let base_url = spawn_backend(error_router()).await;
    let t = logged_in_client(&base_url, "access-1");

    let error = api_error(t.client.get_class(ClassId::new(9)).await);

    assert_eq!(error.status_code, 404);
    assert_eq!(error.message, "Class not found");
    assert_eq!(error.code.as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_jsonでないボディは既定のメッセージになり通知される() {
    let base_url = spawn_backend(error_router()).await;
    let t = logged_in_client(&base_url, "access-1");

    let error = api_error(t.client.dashboard_stats().await);

    assert_eq!(error.status_code, 502);
    assert_eq!(error.message, "Request failed with status 502");
    assert_eq!(t.events.errors().len(), 1);
}

#[tokio::test]
async fn test_ネットワークエラーはステータス0で通知される() {
    let base_url = unreachable_base_url().await;
    let t = logged_in_client(&base_url, "access-1");

    let error = api_error(t.client.dashboard_stats().await);

    assert_eq!(error.status_code, 0);
    assert_eq!(error.code.as_deref(), Some("NETWORK_ERROR"));
    assert!(error.message.starts_with("Network error: "));
    assert_eq!(t.events.errors().len(), 1);
    assert!(t.events.session_expirations().is_empty());
}

#[tokio::test]
async fn test_ログインの401はリフレッシュも通知もしない() {
    let base_url = spawn_backend(error_router()).await;
    let t = client_with_tokens(&base_url, None);
    let credentials = LoginCredentials::new("bursar@school.test", "wrong").unwrap();

    let error = api_error(t.client.login(&credentials).await);

    assert_eq!(error.status_code, 401);
    assert_eq!(error.message, "Invalid credentials");
    assert!(t.events.errors().is_empty());
    assert!(t.events.session_expirations().is_empty());
}

/// 受け取ったヘッダーを記録するスタブ
#[derive(Default)]
struct SeenHeaders {
    requests: Mutex<Vec<(Option<String>, Option<String>)>>,
}

fn header_router(seen: Arc<SeenHeaders>) -> Router {
    Router::new()
        .route(
            "/auth/me",
            get(
                |State(seen): State<Arc<SeenHeaders>>, headers: HeaderMap| async move {
                    let request_id = headers
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    seen.requests
                        .lock()
                        .unwrap()
                        .push((request_id, bearer(&headers)));
                    Json(json!({
                        "success": true,
                        "data": {
                            "user": {
                                "id": 7,
                                "email": "bursar@school.test",
                                "name": "Bursar",
                                "role": "accountant"
                            }
                        }
                    }))
                    .into_response()
                },
            ),
        )
        .with_state(seen)
}

#[rstest]
#[case::with_token(Some("access-1"))]
#[case::without_token(None)]
#[tokio::test]
async fn test_リクエストごとにuuid_v7のrequest_idとbearerが付く(#[case] token: Option<&str>) {
    let seen = Arc::new(SeenHeaders::default());
    let base_url = spawn_backend(header_router(seen.clone())).await;
    let t = match token {
        Some(token) => logged_in_client(&base_url, token),
        None => client_with_tokens(&base_url, None),
    };

    let first = t.client.me().await.unwrap();
    t.client.me().await.unwrap();

    assert_eq!(first.data.role, UserRole::Accountant);

    let requests = seen.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    for (request_id, authorization) in &requests {
        let request_id = request_id.as_deref().expect("X-Request-Id が無い");
        assert_eq!(Uuid::parse_str(request_id).unwrap().get_version_num(), 7);
        assert_eq!(authorization.as_deref(), token);
    }
    assert_ne!(requests[0].0, requests[1].0, "Request ID はリクエストごとに異なる");
}
