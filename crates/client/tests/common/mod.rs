//! テスト共通フィクスチャ
//!
//! axum で立てたスタブバックエンドに対してクライアントを動かすためのヘルパー。
//! Rust の統合テスト規約に従い `tests/common/mod.rs` に配置。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use schoolfee_client::{ApiClient, ClientConfig, MemoryTokenStore, RecordingEvents, TokenStore};
use schoolfee_domain::auth::TokenPair;
use serde_json::{Value, json};

/// スタブバックエンドを起動し、`/api` を含むベース URL を返す
///
/// `router` は `/api` 配下にネストされる。
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("スタブバックエンドのポートを確保できません");
    let addr = listener.local_addr().unwrap();
    let app = Router::new().nest("/api", router);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/api")
}

/// 何も待ち受けていないベース URL を返す
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

/// テスト用クライアント一式
pub struct TestClient {
    pub client: ApiClient,
    pub tokens: Arc<MemoryTokenStore>,
    pub events: Arc<RecordingEvents>,
}

/// 初期トークンを持つクライアントを作成する
pub fn client_with_tokens(base_url: &str, tokens: Option<TokenPair>) -> TestClient {
    let store = Arc::new(match tokens {
        Some(pair) => MemoryTokenStore::with_tokens(pair),
        None => MemoryTokenStore::new(),
    });
    let events = Arc::new(RecordingEvents::new());

    let config = ClientConfig::new(base_url)
        .unwrap()
        .with_login_route("/login");
    let client = ApiClient::builder(config)
        .token_store(store.clone() as Arc<dyn TokenStore>)
        .events(events.clone())
        .build()
        .unwrap();

    TestClient {
        client,
        tokens: store,
        events,
    }
}

/// アクセス・リフレッシュ両方のトークンを持つクライアントを作成する
pub fn logged_in_client(base_url: &str, access_token: &str) -> TestClient {
    client_with_tokens(
        base_url,
        Some(TokenPair::new(access_token, Some("refresh-1".to_string()))),
    )
}

/// 生徒レコードの JSON
pub fn student_json(id: i64, first_name: &str) -> Value {
    json!({
        "id": id,
        "admission_number": format!("ADM-{id:03}"),
        "first_name": first_name,
        "last_name": "Otieno",
        "status": "active"
    })
}

/// `Authorization: Bearer <token>` のトークン部分を取り出す
pub fn bearer(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}
