//! # ダッシュボード
//!
//! ダッシュボードの集計値と月次推移を定義する。

use schoolfee_shared::ListResource;
use serde::{Deserialize, Serialize};

use crate::{
    report::CollectionSummary,
    serde_helpers,
    value_objects::Amount,
};

/// ダッシュボードの集計値（`GET /dashboard/stats`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "serde_helpers::count::deserialize")]
    pub total_students: u64,
    #[serde(default, deserialize_with = "serde_helpers::count::deserialize")]
    pub total_classes: u64,
    #[serde(default)]
    pub total_expected: Amount,
    #[serde(default)]
    pub total_collected: Amount,
    #[serde(default)]
    pub overdue_amount: Option<Amount>,
    #[serde(default)]
    pub collected_today: Amount,
    #[serde(default, deserialize_with = "serde_helpers::count::deserialize")]
    pub payments_today: u64,
}

impl DashboardStats {
    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary::from_totals(
            self.total_expected,
            self.total_collected,
            self.overdue_amount,
        )
    }
}

/// 月次の徴収額（`GET /dashboard/collection-trend`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCollection {
    /// `YYYY-MM` または月名
    pub month:     String,
    #[serde(alias = "total", alias = "amount")]
    pub collected: Amount,
    #[serde(default)]
    pub expected:  Option<Amount>,
}

impl ListResource for MonthlyCollection {
    const LIST_KEY: &'static str = "trend";
    const RECORD_KEY: &'static str = "month";
}
