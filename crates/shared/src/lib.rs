//! # SchoolFee 共有ユーティリティ
//!
//! 学費管理バックエンドとの通信で全クレートが使う共通型を提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, client, console）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える
//!
//! ## モジュール構成
//!
//! - [`api_response`] - 成功レスポンスのエンベロープ `{ success, data, message?, error? }`
//! - [`api_error`] - 正規化済みエラー `{ message, code?, details?, statusCode }`
//! - [`pagination`] - ページネーション情報と一覧ページ
//! - [`envelope`] - 一覧レスポンスの形状正規化と型付きデコード
//! - [`observability`] - トレーシング初期化

pub mod api_error;
pub mod api_response;
pub mod envelope;
pub mod observability;
pub mod pagination;

pub use api_error::{ApiError, ErrorCategory};
pub use api_response::ApiResponse;
pub use envelope::{
    DecodeError,
    ListResource,
    NormalizedList,
    decode_list,
    decode_page,
    decode_record,
    normalize_list,
};
pub use pagination::{Page, PageRequest, Pagination};
