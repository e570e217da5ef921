//! # SchoolFee ドメイン層
//!
//! 学費管理バックエンドが返すレコードと、送信前に検証される入力を型として定義する。
//!
//! ## 設計方針
//!
//! - **レコード**: バックエンドの snake_case JSON をそのまま表す読み取り専用の型
//! - **入力**: コンストラクタで必須項目と金額を検証する書き込み用の型
//! - **ID**: 整数 ID を Newtype で包み、取り違えをコンパイル時に防ぐ
//!
//! 業務ルール（残高の確定、滞納判定など）はバックエンドが持つ。
//! ここで計算するのは画面に出す合計と割合だけである。
//!
//! ## 依存関係の方向
//!
//! ```text
//! console → client → domain → shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`error`] - 入力検証エラー
//! - [`value_objects`] - 金額・必須文字列などの共通値オブジェクト
//! - [`student`] / [`class`] / [`fee`] / [`payment`] - 管理対象レコード
//! - [`report`] / [`dashboard`] - 集計レコードとクライアント側の計算
//! - [`settings`] / [`parent`] / [`auth`] - 学校設定・保護者ポータル・認証
//!
//! ## 使用例
//!
//! ```rust
//! use schoolfee_domain::{DomainError, value_objects::Amount};
//!
//! let amount = Amount::parse("250.00").unwrap();
//! assert_eq!(amount.minor_units(), 25_000);
//!
//! let error = Amount::ZERO.positive().unwrap_err();
//! assert!(matches!(error, DomainError::Validation(_)));
//! ```

#[macro_use]
mod macros;

pub mod auth;
pub mod class;
pub mod dashboard;
pub mod error;
pub mod fee;
pub mod parent;
pub mod payment;
pub mod report;
pub mod serde_helpers;
pub mod settings;
pub mod student;
pub mod value_objects;

pub use error::DomainError;
