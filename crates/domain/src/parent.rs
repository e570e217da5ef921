//! # 保護者ポータル
//!
//! 保護者が閲覧できる子どもの学費状況を定義する。

use schoolfee_shared::ListResource;
use serde::{Deserialize, Serialize};

use crate::{student::StudentId, value_objects::Amount};

/// 子どもの学費状況（`GET /parent/children`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSummary {
    #[serde(alias = "id")]
    pub student_id: StudentId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub admission_number: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub total_fees: Amount,
    #[serde(default)]
    pub total_paid: Amount,
}

impl ChildSummary {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// 未払い残高（0 を下回らない）
    pub fn balance(&self) -> Amount {
        self.total_fees.saturating_sub_floor(self.total_paid)
    }
}

impl ListResource for ChildSummary {
    const LIST_KEY: &'static str = "children";
    const RECORD_KEY: &'static str = "child";
}

/// 子どもの費目一覧のキー（`GET /parent/children/{id}/fees`）
pub const CHILD_FEES_KEY: &str = "fees";
