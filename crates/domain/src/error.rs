//! # ドメイン層エラー定義
//!
//! 送信前の入力検証で発生するエラーを表現する。
//!
//! 学費管理の業務ルールはバックエンドが持つため、クライアント側で検出するのは
//! 必須項目の未入力や明らかに不正な値（0 以下の金額など）に限られる。
//!
//! ## 使用例
//!
//! ```rust
//! use schoolfee_domain::DomainError;
//!
//! fn validate_reason(reason: &str) -> Result<(), DomainError> {
//!     if reason.trim().is_empty() {
//!         return Err(DomainError::Validation("取消理由は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_reason("").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 不正な金額・範囲
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}

impl DomainError {
    /// 利用者向けのメッセージ（接頭辞なし）
    pub fn message(&self) -> &str {
        match self {
            DomainError::Validation(message) => message,
        }
    }
}
