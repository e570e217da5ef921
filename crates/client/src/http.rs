//! # HTTP クライアント
//!
//! バックエンド REST API への全リクエストが通る唯一の入口。
//!
//! ## 責務
//!
//! - トークンストアのアクセストークンを `Authorization: Bearer` として付与する
//! - リクエストごとに UUID v7 の `X-Request-Id` を付与する
//! - 401 を受けたら 1 回だけリフレッシュして元のリクエストを再送する
//! - 非 2xx とネットワークエラーを [`ApiError`] に正規化し、401 以外を通知する
//! - 2xx のボディを [`ApiResponse`] に寄せる
//!
//! ## リフレッシュの状態遷移
//!
//! ```text
//! Initial ──401──▶ refresh ──成功──▶ Retrying ──401──▶ Err(Api 401)
//!                     │
//!                     └──失敗──▶ トークン破棄 + session_expired ──▶ Err(SessionExpired)
//! ```
//!
//! 同時に 401 を受けたリクエストはリフレッシュを共有する。リフレッシュは非同期ミューテックスの
//! 中で行い、失敗したトークンが既に置き換わっていれば、リフレッシュせず新しいトークンで再送する。

use std::{sync::Arc, time::{Duration, Instant}};

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use schoolfee_domain::auth::TokenResponse;
use schoolfee_shared::{ApiError, ApiResponse};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    config::{ClientConfig, ConfigError},
    error::ClientError,
    events::{ClientEvents, TracingEvents},
    token_store::{MemoryTokenStore, TokenStore},
    transfer::MultipartBody,
};

/// Request ID ヘッダー名
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ログインのパス（401 でもリフレッシュしない）
pub const LOGIN_PATH: &str = "/auth/login";

/// リフレッシュのパス（401 でもリフレッシュしない）
pub const REFRESH_PATH: &str = "/auth/refresh";

/// リクエストごとの追加設定
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// クエリパラメータ
    pub query:   Vec<(String, String)>,
    /// 追加ヘッダー
    pub headers: HeaderMap,
    /// このリクエストだけのタイムアウト
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// クエリパラメータを 1 つ追加する
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// クエリパラメータをまとめて追加する
    pub fn with_query(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// リクエストボディ
///
/// 再送のたびに組み立て直せるよう参照で持つ。
pub(crate) enum Payload<'a> {
    Empty,
    Json(&'a Value),
    Multipart(&'a MultipartBody<'a>),
}

/// リフレッシュ再送の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    Retrying,
}

/// バックエンド REST API のクライアント
///
/// 内部状態は `Arc` で共有されるため、`clone()` しても同じトークンストア・
/// リフレッシュ用ミューテックスを使う。
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config:       ClientConfig,
    http:         reqwest::Client,
    tokens:       Arc<dyn TokenStore>,
    events:       Arc<dyn ClientEvents>,
    refresh_lock: Mutex<()>,
}

/// [`ApiClient`] のビルダー
pub struct ApiClientBuilder {
    config: ClientConfig,
    tokens: Option<Arc<dyn TokenStore>>,
    events: Option<Arc<dyn ClientEvents>>,
}

impl ApiClientBuilder {
    /// トークンストアを指定する（既定は [`MemoryTokenStore`]）
    pub fn token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// イベントの受け手を指定する（既定は [`TracingEvents`]）
    pub fn events(mut self, events: Arc<dyn ClientEvents>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<ApiClient, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                http,
                tokens: self
                    .tokens
                    .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
                events: self.events.unwrap_or_else(|| Arc::new(TracingEvents)),
                refresh_lock: Mutex::new(()),
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            tokens: None,
            events: None,
        }
    }

    /// 既定のトークンストア・イベントで作成する
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.tokens
    }

    pub fn events(&self) -> &Arc<dyn ClientEvents> {
        &self.inner.events
    }

    // ===== 公開 API =====

    /// GET
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: &RequestConfig,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::GET, path, None, config).await
    }

    /// POST
    ///
    /// `body` が `null` にシリアライズされる値（`&()` など）の場合はボディを送らない。
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: &RequestConfig,
    ) -> Result<ApiResponse<T>, ClientError> {
        let body = to_body(body)?;
        self.request(Method::POST, path, body.as_ref(), config).await
    }

    /// PUT
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: &RequestConfig,
    ) -> Result<ApiResponse<T>, ClientError> {
        let body = to_body(body)?;
        self.request(Method::PUT, path, body.as_ref(), config).await
    }

    /// PATCH
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        config: &RequestConfig,
    ) -> Result<ApiResponse<T>, ClientError> {
        let body = to_body(body)?;
        self.request(Method::PATCH, path, body.as_ref(), config).await
    }

    /// DELETE
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        config: &RequestConfig,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::DELETE, path, None, config).await
    }

    /// 任意のメソッドで送信し、エンベロープに寄せて `data` を型付きで返す
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        config: &RequestConfig,
    ) -> Result<ApiResponse<T>, ClientError> {
        let body = self.request_value(method, path, body, config).await?;
        Ok(ApiResponse::from_body(body).decode()?)
    }

    /// 任意のメソッドで送信し、レスポンスボディをそのまま返す
    ///
    /// 一覧の `pagination` のように `data` の兄弟に置かれる値を読む場合に使う。
    /// 空のボディは `null` になる。
    pub async fn request_value(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        config: &RequestConfig,
    ) -> Result<Value, ClientError> {
        let payload = body.map_or(Payload::Empty, Payload::Json);
        let response = self.send(method, path, &payload, config).await?;
        self.read_json(response).await
    }

    // ===== 内部 =====

    /// リクエストを送信し、2xx のレスポンスを返す
    ///
    /// 認証付与・リフレッシュ再送・エラー正規化はすべてここで行う。
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        payload: &Payload<'_>,
        config: &RequestConfig,
    ) -> Result<reqwest::Response, ClientError> {
        let mut attempt = Attempt::Initial;

        loop {
            let access_token = self
                .inner
                .tokens
                .get()
                .await?
                .map(|pair| pair.access_token);
            let request_id = Uuid::now_v7().to_string();
            let started = Instant::now();

            let builder = self.build_request(
                &method,
                path,
                payload,
                config,
                access_token.as_deref(),
                &request_id,
            );

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(
                        %method,
                        path,
                        request_id = %request_id,
                        elapsed = ?started.elapsed(),
                        error = %e,
                        "API リクエストが失敗"
                    );
                    return Err(self.report(ApiError::network(e)));
                }
            };

            let status = response.status();
            tracing::debug!(
                %method,
                path,
                request_id = %request_id,
                status = status.as_u16(),
                elapsed = ?started.elapsed(),
                "API リクエスト"
            );

            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED
                && attempt == Attempt::Initial
                && allows_refresh(path)
            {
                self.refresh(access_token.as_deref()).await?;
                attempt = Attempt::Retrying;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(self.report(ApiError::from_response_body(status.as_u16(), &body)));
        }
    }

    fn build_request(
        &self,
        method: &Method,
        path: &str,
        payload: &Payload<'_>,
        config: &RequestConfig,
        access_token: Option<&str>,
        request_id: &str,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .inner
            .http
            .request(method.clone(), self.inner.config.endpoint(path))
            .header(REQUEST_ID_HEADER, request_id)
            .headers(config.headers.clone());

        if !config.query.is_empty() {
            builder = builder.query(&config.query);
        }
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        match payload {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(body),
            Payload::Multipart(body) => builder.multipart(body.to_form()),
        }
    }

    /// 2xx レスポンスのボディを JSON として読む（空なら `null`）
    pub(crate) async fn read_json(&self, response: reqwest::Response) -> Result<Value, ClientError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.report(ApiError::network(e)))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// 正規化済みエラーを通知してクライアントエラーにする（401 は通知しない）
    pub(crate) fn report(&self, error: ApiError) -> ClientError {
        if !error.is_unauthorized() {
            self.inner.events.error(&error);
        }
        ClientError::Api(error)
    }

    /// アクセストークンをリフレッシュする
    ///
    /// `failed_token` は 401 を受けたリクエストが使ったトークン。
    async fn refresh(&self, failed_token: Option<&str>) -> Result<(), ClientError> {
        let _guard = self.inner.refresh_lock.lock().await;

        let current = self.inner.tokens.get().await?;
        match (&current, failed_token) {
            (Some(pair), _) if Some(pair.access_token.as_str()) != failed_token => {
                tracing::debug!("トークンは別のリクエストで更新済み");
                return Ok(());
            }
            // 別のリクエストのリフレッシュ失敗で破棄済み
            (None, Some(_)) => return Err(ClientError::SessionExpired),
            _ => {}
        }

        let Some(refresh_token) = current.and_then(|pair| pair.refresh_token) else {
            return self.expire_session("リフレッシュトークンがありません").await;
        };

        match self.request_refresh(&refresh_token).await {
            Ok(response) => {
                self.inner
                    .tokens
                    .set(response.into_pair(Some(refresh_token)))
                    .await?;
                tracing::debug!("アクセストークンを更新");
                Ok(())
            }
            Err(reason) => self.expire_session(&reason).await,
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenResponse, String> {
        let response = self
            .inner
            .http
            .post(self.inner.config.endpoint(REFRESH_PATH))
            .header(REQUEST_ID_HEADER, Uuid::now_v7().to_string())
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| format!("ネットワークエラー: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("リフレッシュが拒否されました: {status}"));
        }

        let body: Value = response.json().await.map_err(|e| e.to_string())?;
        serde_json::from_value(ApiResponse::from_body(body).data).map_err(|e| e.to_string())
    }

    async fn expire_session(&self, reason: &str) -> Result<(), ClientError> {
        tracing::warn!(reason, "トークンのリフレッシュに失敗");
        if let Err(e) = self.inner.tokens.clear().await {
            tracing::error!(error = %e, "トークンを破棄できません");
        }
        self.inner
            .events
            .session_expired(&self.inner.config.login_route);
        Err(ClientError::SessionExpired)
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Option<Value>, ClientError> {
    let value = serde_json::to_value(body)?;
    Ok((!value.is_null()).then_some(value))
}

/// 401 を受けたときにリフレッシュしてよいパスか
fn allows_refresh(path: &str) -> bool {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    let normalized = format!("/{}", path.trim_matches('/'));
    normalized != LOGIN_PATH && normalized != REFRESH_PATH
}
