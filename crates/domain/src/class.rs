//! # クラス
//!
//! クラス（学年・組）のレコードと入力を定義する。

use schoolfee_shared::ListResource;
use serde::{Deserialize, Serialize};

use crate::{
    DomainError,
    serde_helpers,
    value_objects::{ClassName, optional_text},
};

define_id! {
    /// クラス ID
    pub struct ClassId;
}

/// クラスレコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolClass {
    pub id: ClassId,
    pub name: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::count::deserialize")]
    pub student_count: u64,
}

impl SchoolClass {
    /// 表示名（組があれば `name - section`）
    pub fn display_name(&self) -> String {
        match &self.section {
            Some(section) if !section.is_empty() => format!("{} - {}", self.name, section),
            _ => self.name.clone(),
        }
    }
}

impl ListResource for SchoolClass {
    const LIST_KEY: &'static str = "classes";
    const RECORD_KEY: &'static str = "class";
}

/// クラスの登録・更新
///
/// 更新（`PUT /classes/{id}`）も同じ形の全項目を送る。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewClass {
    pub name: ClassName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
}

impl NewClass {
    pub fn new(
        name: impl Into<String>,
        section: Option<String>,
        academic_year: Option<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: ClassName::new(name)?,
            section: optional_text(section),
            academic_year: optional_text(academic_year),
        })
    }
}
