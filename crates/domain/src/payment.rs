//! # 支払い
//!
//! 支払いレコードと、記録・取消の入力を定義する。
//!
//! 支払いは削除せず、取消（void）で無効化する。取消には理由が必須。

use chrono::{DateTime, NaiveDate, Utc};
use schoolfee_shared::{ListResource, PageRequest};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    fee::FeeAssignmentId,
    student::StudentId,
    value_objects::{Amount, Reason, optional_text},
};

define_id! {
    /// 支払い ID
    pub struct PaymentId;
}

/// 支払方法
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
pub enum PaymentMethod {
    #[default]
    Cash,
    BankTransfer,
    Card,
    MobileMoney,
    Cheque,
}

/// 支払いの状態
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
pub enum PaymentStatus {
    #[default]
    Completed,
    Pending,
    Voided,
}

/// 支払いレコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub student_id: StudentId,
    #[serde(default)]
    pub fee_assignment_id: Option<FeeAssignmentId>,
    #[serde(default)]
    pub student_name: Option<String>,
    pub amount: Amount,
    #[serde(default, alias = "payment_method")]
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub void_reason: Option<String>,
}

impl Payment {
    pub fn is_voided(&self) -> bool {
        self.status == PaymentStatus::Voided
    }
}

impl ListResource for Payment {
    const LIST_KEY: &'static str = "payments";
    const RECORD_KEY: &'static str = "payment";
}

/// 支払いの記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPayment {
    pub student_id: StudentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_assignment_id: Option<FeeAssignmentId>,
    pub amount: Amount,
    #[serde(rename = "payment_method")]
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewPayment {
    /// 支払いの記録内容を作成する
    ///
    /// # エラー
    ///
    /// 金額が 0 以下の場合
    pub fn new(
        student_id: StudentId,
        amount: Amount,
        method: PaymentMethod,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            student_id,
            fee_assignment_id: None,
            amount: amount.positive()?,
            method,
            reference: None,
            payment_date: None,
            notes: None,
        })
    }

    pub fn for_assignment(mut self, assignment_id: FeeAssignmentId) -> Self {
        self.fee_assignment_id = Some(assignment_id);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = optional_text(Some(reference.into()));
        self
    }

    pub fn with_payment_date(mut self, date: NaiveDate) -> Self {
        self.payment_date = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = optional_text(Some(notes.into()));
        self
    }
}

/// 支払いの取消
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoidPayment {
    pub reason: Reason,
}

impl VoidPayment {
    /// # エラー
    ///
    /// 理由が空の場合
    pub fn new(reason: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            reason: Reason::new(reason)?,
        })
    }
}

/// 支払い一覧の絞り込み条件
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentFilter {
    pub page: PageRequest,
    pub search: Option<String>,
    pub student_id: Option<StudentId>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PaymentFilter {
    /// クエリパラメータに変換する（未指定の項目は含めない）
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .page
            .to_query()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let optional = [
            ("search", optional_text(self.search.clone())),
            ("student_id", self.student_id.map(|id| id.to_string())),
            ("payment_method", self.method.map(|m| m.to_string())),
            ("status", self.status.map(|s| s.to_string())),
            ("start_date", self.start_date.map(|d| d.to_string())),
            ("end_date", self.end_date.map(|d| d.to_string())),
        ];
        query.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key.to_string(), v))),
        );
        query
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_取消済みの支払いをデコードできる() {
        let payment: Payment = serde_json::from_value(json!({
            "id": 44,
            "student_id": 7,
            "amount": "500.00",
            "method": "mobile_money",
            "status": "voided",
            "receipt_number": "RCP-2024-0044",
            "paid_at": "2024-02-01T09:30:00Z",
            "void_reason": "Duplicate entry"
        }))
        .unwrap();

        assert!(payment.is_voided());
        assert_eq!(payment.method, PaymentMethod::MobileMoney);
        assert_eq!(payment.amount, Amount::from_minor(50_000));
    }

    #[test]
    fn test_支払い記録の送る形() {
        let input = NewPayment::new(StudentId::new(7), Amount::from_minor(1_000), PaymentMethod::Cash)
            .unwrap()
            .for_assignment(FeeAssignmentId::new(12))
            .with_reference("  ")
            .with_payment_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({
                "student_id": 7,
                "fee_assignment_id": 12,
                "amount": 10.0,
                "payment_method": "cash",
                "payment_date": "2024-03-01"
            })
        );
    }

    #[test]
    fn test_負の金額は記録できない() {
        let result = NewPayment::new(StudentId::new(1), Amount::from_minor(-100), PaymentMethod::Card);

        assert!(result.is_err());
    }

    #[test]
    fn test_取消理由は必須() {
        assert!(VoidPayment::new("   ").is_err());
        assert_eq!(
            serde_json::to_value(VoidPayment::new("Bounced cheque").unwrap()).unwrap(),
            json!({ "reason": "Bounced cheque" })
        );
    }

    #[test]
    fn test_支払い絞り込みのクエリ() {
        let filter = PaymentFilter {
            page: PageRequest::new(3, 25),
            method: Some(PaymentMethod::BankTransfer),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };

        assert_eq!(
            filter.to_query(),
            vec![
                ("page".to_string(), "3".to_string()),
                ("limit".to_string(), "25".to_string()),
                ("payment_method".to_string(), "bank_transfer".to_string()),
                ("start_date".to_string(), "2024-01-01".to_string()),
            ]
        );
    }
}
