//! # SchoolFee クライアント
//!
//! 学費管理バックエンドの REST API を呼び出すクライアント層。
//!
//! ## モジュール構成
//!
//! - [`config`] - 環境変数からのクライアント設定
//! - [`token_store`] - アクセストークン・リフレッシュトークンの保管場所
//! - [`events`] - エラー通知とセッション切れの通知
//! - [`http`] - 認証付与・リフレッシュ再送・エラー正規化を行う HTTP クライアント
//! - [`transfer`] - multipart アップロードとダウンロード
//! - [`fetch`] - 非同期操作の状態（`data / loading / error`）を保持する取得ハンドル
//! - [`api`] - リソースごとの API トレイト
//!
//! ## 使用例
//!
//! ```no_run
//! use schoolfee_client::{
//!     ApiClient, ClientConfig,
//!     api::StudentsApi,
//! };
//! use schoolfee_domain::student::StudentFilter;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ClientConfig::from_env()?)?;
//! let students = client.list_students(&StudentFilter::default()).await?;
//! println!("{} 件 / 全 {} ページ", students.data.len(), students.data.total_pages());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod http;
pub mod token_store;
pub mod transfer;

pub use api::SchoolFeeApi;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use events::{ClientEvents, RecordingEvents, TracingEvents};
pub use fetch::{ApplyPolicy, FetchHandle, FetchOptions, FetchState};
pub use crate::http::{ApiClient, ApiClientBuilder, RequestConfig};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
pub use transfer::{Download, ProgressFn, UploadFile, UploadProgress};
