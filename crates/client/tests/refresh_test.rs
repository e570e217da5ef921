//! # トークンリフレッシュの統合テスト
//!
//! スタブバックエンドに対して 401 → リフレッシュ → 再送の流れを検証する。
//!
//! - 401 を受けたら 1 回だけリフレッシュし、元のリクエストを透過的に再送する
//! - 再送でも 401 なら、再度のリフレッシュはせずエラーを返す
//! - リフレッシュに失敗したらトークンを破棄し、セッション切れを通知する
//! - 同時に 401 を受けたリクエストはリフレッシュを共有する

mod common;

use std::{
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json,
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use common::{bearer, logged_in_client, spawn_backend, student_json};
use pretty_assertions::assert_eq;
use schoolfee_client::{
    ClientError,
    TokenStore,
    api::{AuthApi, StudentsApi},
};
use schoolfee_domain::{auth::TokenPair, student::StudentFilter};
use serde_json::{Value, json};

/// リフレッシュの振る舞いを切り替えられるスタブ
struct AuthBackend {
    valid_token:      &'static str,
    refresh_succeeds: bool,
    refresh_calls:    AtomicUsize,
    refresh_bodies:   Mutex<Vec<Value>>,
    students_calls:   AtomicUsize,
}

impl AuthBackend {
    fn new(refresh_succeeds: bool) -> Arc<Self> {
        Arc::new(Self {
            valid_token: "access-2",
            refresh_succeeds,
            refresh_calls: AtomicUsize::new(0),
            refresh_bodies: Mutex::new(Vec::new()),
            students_calls: AtomicUsize::new(0),
        })
    }

    fn is_valid(&self, headers: &HeaderMap) -> bool {
        bearer(headers).as_deref() == Some(self.valid_token)
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Token expired" })),
    )
        .into_response()
}

async fn list_students(State(backend): State<Arc<AuthBackend>>, headers: HeaderMap) -> Response {
    backend.students_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.is_valid(&headers) {
        return unauthorized();
    }
    Json(json!({
        "success": true,
        "data": {
            "students": [student_json(1, "Amina"), student_json(2, "Baraka")],
            "pagination": { "page": 1, "limit": 10, "total": 2 }
        }
    }))
    .into_response()
}

async fn refresh(State(backend): State<Arc<AuthBackend>>, Json(body): Json<Value>) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    backend.refresh_bodies.lock().unwrap().push(body);
    // 同時に 401 を受けたリクエストが重なるよう少し待つ
    tokio::time::sleep(Duration::from_millis(50)).await;

    if !backend.refresh_succeeds {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid refresh token" })),
        )
            .into_response();
    }
    Json(json!({ "success": true, "data": { "token": "access-2" } })).into_response()
}

fn router(backend: Arc<AuthBackend>) -> Router {
    Router::new()
        .route("/students", get(list_students))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(|| async { unauthorized() }))
        .with_state(backend)
}

#[tokio::test]
async fn test_401を受けると1回だけリフレッシュして再送する() {
    let backend = AuthBackend::new(true);
    let base_url = spawn_backend(router(backend.clone())).await;
    let t = logged_in_client(&base_url, "access-1");

    let response = t
        .client
        .list_students(&StudentFilter::default())
        .await
        .unwrap();

    assert_eq!(response.data.items.len(), 2);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.students_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        backend.refresh_bodies.lock().unwrap().clone(),
        vec![json!({ "refresh_token": "refresh-1" })]
    );
    // 応答にリフレッシュトークンが無ければ以前のものを保持する
    assert_eq!(
        t.tokens.get().await.unwrap(),
        Some(TokenPair::new("access-2", Some("refresh-1".to_string())))
    );
    assert!(t.events.errors().is_empty());
    assert!(t.events.session_expirations().is_empty());
}

#[tokio::test]
async fn test_有効なトークンならリフレッシュしない() {
    let backend = AuthBackend::new(true);
    let base_url = spawn_backend(router(backend.clone())).await;
    let t = logged_in_client(&base_url, "access-2");

    t.client
        .list_students(&StudentFilter::default())
        .await
        .unwrap();

    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.students_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_再送でも401なら再度リフレッシュせずエラーを返す() {
    let backend = AuthBackend::new(true);
    let base_url = spawn_backend(router(backend.clone())).await;
    let t = logged_in_client(&base_url, "access-1");

    let error = match t.client.me().await {
        Err(ClientError::Api(error)) => error,
        other => panic!("401 の ApiError を期待しました: {other:?}"),
    };
    assert_eq!(error.status_code, 401);
    assert_eq!(error.message, "Token expired");
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    // 401 は通知しない
    assert!(t.events.errors().is_empty());
    assert!(t.events.session_expirations().is_empty());
}

#[tokio::test]
async fn test_リフレッシュに失敗するとトークンを破棄してセッション切れを通知する() {
    let backend = AuthBackend::new(false);
    let base_url = spawn_backend(router(backend.clone())).await;
    let t = logged_in_client(&base_url, "access-1");

    let result = t.client.list_students(&StudentFilter::default()).await;

    assert!(matches!(result, Err(ClientError::SessionExpired)));
    assert_eq!(t.tokens.get().await.unwrap(), None);
    assert_eq!(t.events.session_expirations(), vec!["/login".to_string()]);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.students_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_リフレッシュトークンが無ければリフレッシュせずセッション切れになる() {
    let backend = AuthBackend::new(true);
    let base_url = spawn_backend(router(backend.clone())).await;
    let t = common::client_with_tokens(&base_url, Some(TokenPair::new("access-1", None)));

    let result = t.client.list_students(&StudentFilter::default()).await;

    assert!(matches!(result, Err(ClientError::SessionExpired)));
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(t.tokens.get().await.unwrap(), None);
    assert_eq!(t.events.session_expirations().len(), 1);
}

#[tokio::test]
async fn test_同時に401を受けたリクエストはリフレッシュを共有する() {
    let backend = AuthBackend::new(true);
    let base_url = spawn_backend(router(backend.clone())).await;
    let t = logged_in_client(&base_url, "access-1");
    let filter = StudentFilter::default();

    let (a, b, c) = tokio::join!(
        t.client.list_students(&filter),
        t.client.list_students(&filter),
        t.client.list_students(&filter),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_同時にリフレッシュが失敗してもセッション切れの通知は1回() {
    let backend = AuthBackend::new(false);
    let base_url = spawn_backend(router(backend.clone())).await;
    let t = logged_in_client(&base_url, "access-1");
    let filter = StudentFilter::default();

    let (a, b) = tokio::join!(
        t.client.list_students(&filter),
        t.client.list_students(&filter),
    );

    assert!(matches!(a, Err(ClientError::SessionExpired)));
    assert!(matches!(b, Err(ClientError::SessionExpired)));
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(t.events.session_expirations().len(), 1);
}
