//! # レポート
//!
//! 徴収状況レポートのレコードと、画面に出す合計・割合の計算を定義する。
//!
//! 集計そのものはバックエンドが行う。クライアント側で計算するのは
//! 未収額（`expected - collected`、0 未満にしない）と徴収率だけである。

use chrono::NaiveDate;
use schoolfee_shared::ListResource;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    class::ClassId,
    serde_helpers,
    student::StudentId,
    value_objects::{Amount, percentage},
};

/// 徴収状況の要約
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionSummary {
    pub expected:        Amount,
    pub collected:       Amount,
    pub outstanding:     Amount,
    /// 徴収率（%、小数第 1 位）
    pub collection_rate: f64,
    /// 期日超過の未収額。API が返した場合のみ値を持つ
    // TODO: バックエンドが期日超過額を返さないレポートでは割り当ての due_date から集計する
    pub overdue_amount:  Option<Amount>,
}

impl CollectionSummary {
    /// 請求総額と徴収総額から要約を作る
    ///
    /// - `outstanding = max(expected - collected, 0)`
    /// - `collection_rate = collected / expected * 100`（`expected == 0` なら 0）
    pub fn from_totals(expected: Amount, collected: Amount, overdue: Option<Amount>) -> Self {
        Self {
            expected,
            collected,
            outstanding: expected.saturating_sub_floor(collected),
            collection_rate: percentage(collected, expected),
            overdue_amount: overdue,
        }
    }
}

/// 徴収状況レポート（`GET /reports/collection`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionReport {
    #[serde(default, alias = "total_fees")]
    pub total_expected: Amount,
    #[serde(default)]
    pub total_collected: Amount,
    #[serde(default)]
    pub overdue_amount: Option<Amount>,
    #[serde(default)]
    pub by_method: Vec<MethodBreakdown>,
}

impl CollectionReport {
    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary::from_totals(
            self.total_expected,
            self.total_collected,
            self.overdue_amount,
        )
    }
}

/// 支払方法別の内訳
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBreakdown {
    #[serde(alias = "payment_method")]
    pub method: String,
    pub total:  Amount,
    #[serde(default, deserialize_with = "serde_helpers::count::deserialize")]
    pub count:  u64,
}

/// 未収一覧の行（`GET /reports/outstanding`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingEntry {
    pub student_id: StudentId,
    pub student_name: String,
    #[serde(default)]
    pub admission_number: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub total_due: Amount,
    #[serde(default)]
    pub total_paid: Amount,
    #[serde(default)]
    pub balance: Option<Amount>,
    #[serde(default, deserialize_with = "serde_helpers::optional_date::deserialize")]
    pub oldest_due_date: Option<NaiveDate>,
}

impl OutstandingEntry {
    /// 未収額（API が返さなければ `total_due - total_paid`）
    pub fn outstanding(&self) -> Amount {
        self.balance
            .unwrap_or_else(|| self.total_due.saturating_sub_floor(self.total_paid))
    }
}

impl ListResource for OutstandingEntry {
    const LIST_KEY: &'static str = "outstanding";
    const RECORD_KEY: &'static str = "outstanding_entry";
}

/// クラス別徴収状況（`GET /reports/class-wise`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCollection {
    pub class_id: ClassId,
    pub class_name: String,
    #[serde(default, deserialize_with = "serde_helpers::count::deserialize")]
    pub student_count: u64,
    #[serde(default)]
    pub total_expected: Amount,
    #[serde(default)]
    pub total_collected: Amount,
}

impl ClassCollection {
    /// 徴収率（%、小数第 1 位。請求額が 0 なら 0）
    pub fn collection_rate(&self) -> f64 {
        percentage(self.total_collected, self.total_expected)
    }

    pub fn outstanding(&self) -> Amount {
        self.total_expected.saturating_sub_floor(self.total_collected)
    }
}

impl ListResource for ClassCollection {
    const LIST_KEY: &'static str = "class_collections";
    const RECORD_KEY: &'static str = "class_collection";
}

/// レポートの対象期間
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportPeriod {
    pub start_date: Option<NaiveDate>,
    pub end_date:   Option<NaiveDate>,
    pub class_id:   Option<ClassId>,
}

impl ReportPeriod {
    /// # エラー
    ///
    /// 開始日が終了日より後の場合
    pub fn new(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Result<Self, DomainError> {
        if let (Some(start), Some(end)) = (start_date, end_date)
            && start > end
        {
            return Err(DomainError::Validation(format!(
                "開始日 {start} は終了日 {end} 以前である必要があります"
            )));
        }
        Ok(Self {
            start_date,
            end_date,
            class_id: None,
        })
    }

    pub fn for_class(mut self, class_id: ClassId) -> Self {
        self.class_id = Some(class_id);
        self
    }

    /// クエリパラメータに変換する（未指定の項目は含めない）
    pub fn to_query(&self) -> Vec<(String, String)> {
        [
            ("start_date", self.start_date.map(|d| d.to_string())),
            ("end_date", self.end_date.map(|d| d.to_string())),
            ("class_id", self.class_id.map(|id| id.to_string())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
    }
}

/// エクスポート形式
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Pdf,
    Xlsx,
}

/// エクスポートするレポートの種類
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum ReportKind {
    #[default]
    Collection,
    Outstanding,
    ClassWise,
}
