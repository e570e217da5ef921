//! # 学校設定
//!
//! `GET/PUT /settings/school` で読み書きする学校の基本情報。

use serde::{Deserialize, Serialize};

use crate::{
    DomainError,
    value_objects::{Email, SchoolName, optional_text},
};

/// 学校設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolSettings {
    pub school_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub receipt_prefix: Option<String>,
}

fn default_currency() -> String {
    "KES".to_string()
}

impl SchoolSettings {
    /// 送信前の検証
    ///
    /// 学校名は必須、メールアドレスは指定があれば形式を確認する。
    pub fn validated(mut self) -> Result<Self, DomainError> {
        self.school_name = SchoolName::new(self.school_name)?.into_string();
        self.email = optional_text(self.email)
            .map(|email| Email::new(email).map(|e| e.as_str().to_string()))
            .transpose()?;
        self.address = optional_text(self.address);
        self.phone = optional_text(self.phone);
        Ok(self)
    }
}
