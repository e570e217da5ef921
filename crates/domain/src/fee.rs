//! # 費目と割り当て
//!
//! 費目（授業料・教材費など）と、費目を生徒に割り当てた結果を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`FeeStructure`] | 費目 | 金額と請求周期を持つ請求の雛形 |
//! | [`FeeAssignment`] | 割り当て | 生徒 1 人に対する請求。支払いで消し込まれる |
//! | [`AssignFee`] | 割り当て指示 | 生徒の列挙またはクラス単位で費目を割り当てる |

use chrono::NaiveDate;
use schoolfee_shared::{ListResource, PageRequest};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    class::ClassId,
    serde_helpers,
    student::StudentId,
    value_objects::{Amount, FeeName, optional_text},
};

define_id! {
    /// 費目 ID
    pub struct FeeStructureId;
}

define_id! {
    /// 割り当て ID
    pub struct FeeAssignmentId;
}

/// 請求周期
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeeFrequency {
    #[default]
    OneTime,
    Monthly,
    Quarterly,
    Termly,
    Annually,
}

/// 割り当ての支払状況
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Overdue,
    Waived,
}

fn default_true() -> bool {
    true
}

/// 費目レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeStructure {
    pub id: FeeStructureId,
    pub name: String,
    pub amount: Amount,
    #[serde(default)]
    pub frequency: FeeFrequency,
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default, deserialize_with = "serde_helpers::optional_date::deserialize")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ListResource for FeeStructure {
    const LIST_KEY: &'static str = "fee_structures";
    const RECORD_KEY: &'static str = "fee_structure";
}

/// 割り当てレコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeAssignment {
    pub id: FeeAssignmentId,
    pub student_id: StudentId,
    pub fee_structure_id: FeeStructureId,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub fee_name: Option<String>,
    pub amount: Amount,
    #[serde(default)]
    pub amount_paid: Amount,
    #[serde(default, deserialize_with = "serde_helpers::optional_date::deserialize")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: AssignmentStatus,
}

impl FeeAssignment {
    /// 未払い残高（過払いでも 0 を下回らない）
    pub fn balance(&self) -> Amount {
        self.amount.saturating_sub_floor(self.amount_paid)
    }

    /// 完済済みか
    pub fn is_settled(&self) -> bool {
        self.balance().is_zero()
    }
}

impl ListResource for FeeAssignment {
    const LIST_KEY: &'static str = "assignments";
    const RECORD_KEY: &'static str = "assignment";
}

/// 費目の登録・更新
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFeeStructure {
    pub name: FeeName,
    pub amount: Amount,
    pub frequency: FeeFrequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ClassId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewFeeStructure {
    /// 費目の登録内容を作成する
    ///
    /// # エラー
    ///
    /// - 費目名が空、または最大長を超える
    /// - 金額が 0 以下
    pub fn new(
        name: impl Into<String>,
        amount: Amount,
        frequency: FeeFrequency,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: FeeName::new(name)?,
            amount: amount.positive()?,
            frequency,
            class_id: None,
            due_date: None,
            description: None,
        })
    }

    pub fn with_class(mut self, class_id: ClassId) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = optional_text(Some(description.into()));
        self
    }
}

/// 費目の割り当て指示（`POST /fee-structures/{id}/assign`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignFee {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub student_ids: Vec<StudentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ClassId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl AssignFee {
    /// 割り当て対象を指定する
    ///
    /// # エラー
    ///
    /// 生徒もクラスも指定されていない場合
    pub fn new(student_ids: Vec<StudentId>, class_id: Option<ClassId>) -> Result<Self, DomainError> {
        if student_ids.is_empty() && class_id.is_none() {
            return Err(DomainError::Validation(
                "割り当て対象の生徒またはクラスを指定してください".to_string(),
            ));
        }
        let mut student_ids = student_ids;
        student_ids.sort();
        student_ids.dedup();
        Ok(Self {
            student_ids,
            class_id,
            due_date: None,
        })
    }

    pub fn to_class(class_id: ClassId) -> Self {
        Self {
            student_ids: Vec::new(),
            class_id: Some(class_id),
            due_date: None,
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// 割り当て指示の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    #[serde(
        default,
        alias = "count",
        deserialize_with = "serde_helpers::count::deserialize"
    )]
    pub assigned: u64,
    #[serde(default, deserialize_with = "serde_helpers::count::deserialize")]
    pub skipped:  u64,
}

/// 割り当て一覧の絞り込み条件
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssignmentFilter {
    pub page: PageRequest,
    pub student_id: Option<StudentId>,
    pub fee_structure_id: Option<FeeStructureId>,
    pub class_id: Option<ClassId>,
    pub status: Option<AssignmentStatus>,
}

impl AssignmentFilter {
    /// クエリパラメータに変換する（未指定の項目は含めない）
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .page
            .to_query()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let optional = [
            ("student_id", self.student_id.map(|id| id.to_string())),
            ("fee_structure_id", self.fee_structure_id.map(|id| id.to_string())),
            ("class_id", self.class_id.map(|id| id.to_string())),
            ("status", self.status.map(|s| s.to_string())),
        ];
        query.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key.to_string(), v))),
        );
        query
    }
}
