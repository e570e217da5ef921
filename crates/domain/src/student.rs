//! # 生徒
//!
//! 生徒レコードと、登録・更新時の入力を定義する。
//!
//! ## 型
//!
//! | 型 | 用途 |
//! |---|------|
//! | [`Student`] | `GET /students` などが返すレコード |
//! | [`NewStudent`] | `POST /students` の入力 |
//! | [`StudentUpdate`] | `PUT /students/{id}` の入力（指定した項目のみ送る） |
//! | [`StudentFilter`] | 一覧の絞り込み条件 |

use chrono::{DateTime, Utc};
use schoolfee_shared::{ListResource, PageRequest};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    class::ClassId,
    value_objects::{AdmissionNumber, Email, PersonName, optional_text},
};

define_id! {
    /// 生徒 ID
    pub struct StudentId;
}

/// 在籍状況
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
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Graduated,
    Transferred,
}

/// 生徒レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub admission_number: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
    #[serde(default)]
    pub guardian_email: Option<String>,
    #[serde(default)]
    pub status: StudentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Student {
    /// 表示用の氏名（`first_name last_name`）
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl ListResource for Student {
    const LIST_KEY: &'static str = "students";
    const RECORD_KEY: &'static str = "student";
}

/// 保護者の連絡先
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Guardian {
    #[serde(rename = "guardian_name", skip_serializing_if = "Option::is_none")]
    pub name:  Option<PersonName>,
    #[serde(rename = "guardian_phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "guardian_email", skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

impl Guardian {
    /// 空文字列の項目は未指定として扱う
    pub fn new(
        name: Option<String>,
        phone: Option<String>,
        email: Option<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name:  optional_text(name).map(PersonName::new).transpose()?,
            phone: optional_text(phone),
            email: optional_text(email).map(Email::new).transpose()?,
        })
    }
}

/// 生徒の新規登録
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStudent {
    pub admission_number: AdmissionNumber,
    pub first_name: PersonName,
    pub last_name: PersonName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ClassId>,
    #[serde(flatten)]
    pub guardian: Guardian,
}

impl NewStudent {
    /// 生徒の登録内容を作成する
    ///
    /// # エラー
    ///
    /// 学籍番号・氏名のいずれかが空、または最大長を超える場合
    pub fn new(
        admission_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            admission_number: AdmissionNumber::new(admission_number)?,
            first_name: PersonName::new(first_name)?,
            last_name: PersonName::new(last_name)?,
            class_id: None,
            guardian: Guardian::default(),
        })
    }

    pub fn with_class(mut self, class_id: ClassId) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn with_guardian(mut self, guardian: Guardian) -> Self {
        self.guardian = guardian;
        self
    }
}

/// 生徒情報の更新
///
/// 指定した項目だけがリクエストボディに含まれる。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StudentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_number: Option<AdmissionNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<PersonName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<PersonName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ClassId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,
    #[serde(flatten)]
    pub guardian: Guardian,
}

impl StudentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Result<Self, DomainError> {
        self.first_name = Some(PersonName::new(value)?);
        Ok(self)
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Result<Self, DomainError> {
        self.last_name = Some(PersonName::new(value)?);
        Ok(self)
    }

    pub fn admission_number(mut self, value: impl Into<String>) -> Result<Self, DomainError> {
        self.admission_number = Some(AdmissionNumber::new(value)?);
        Ok(self)
    }

    pub fn class_id(mut self, class_id: ClassId) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn status(mut self, status: StudentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn guardian(mut self, guardian: Guardian) -> Self {
        self.guardian = guardian;
        self
    }

    /// 更新項目が 1 つもないか
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// 一括取り込みの結果（`POST /students/import`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentImportResult {
    #[serde(
        default,
        alias = "created",
        deserialize_with = "crate::serde_helpers::count::deserialize"
    )]
    pub imported: u64,
    #[serde(default, deserialize_with = "crate::serde_helpers::count::deserialize")]
    pub skipped:  u64,
    /// 行ごとのエラー（形はバックエンド依存）
    #[serde(default)]
    pub errors:   Vec<serde_json::Value>,
}

/// 生徒一覧の絞り込み条件
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudentFilter {
    pub page:     PageRequest,
    pub search:   Option<String>,
    pub class_id: Option<ClassId>,
    pub status:   Option<StudentStatus>,
}

impl StudentFilter {
    /// クエリパラメータに変換する（未指定の項目は含めない）
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .page
            .to_query()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        if let Some(search) = optional_text(self.search.clone()) {
            query.push(("search".to_string(), search));
        }
        if let Some(class_id) = self.class_id {
            query.push(("class_id".to_string(), class_id.to_string()));
        }
        if let Some(status) = self.status {
            query.push(("status".to_string(), status.to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_最小限のフィールドでデコードできる() {
        let student: Student = serde_json::from_value(json!({
            "id": 7,
            "admission_number": "ADM-007",
            "first_name": "Amina",
            "last_name": "Otieno"
        }))
        .unwrap();

        assert_eq!(student.id, StudentId::new(7));
        assert_eq!(student.status, StudentStatus::Active);
        assert_eq!(student.class_id, None);
        assert_eq!(student.full_name(), "Amina Otieno");
    }

    #[test]
    fn test_新規登録は未指定の項目を送らない() {
        let input = NewStudent::new(" ADM-1 ", "Amina", "Otieno")
            .unwrap()
            .with_class(ClassId::new(3))
            .with_guardian(Guardian::new(Some("Grace".into()), Some("".into()), None).unwrap());

        let json = serde_json::to_value(&input).unwrap();

        assert_eq!(
            json,
            json!({
                "admission_number": "ADM-1",
                "first_name": "Amina",
                "last_name": "Otieno",
                "class_id": 3,
                "guardian_name": "Grace"
            })
        );
    }

    #[test]
    fn test_新規登録で氏名が空ならエラー() {
        let result = NewStudent::new("ADM-1", "  ", "Otieno");

        assert_eq!(
            result,
            Err(DomainError::Validation("氏名は必須です".to_string()))
        );
    }

    #[test]
    fn test_保護者メールアドレスの形式を検証する() {
        let result = Guardian::new(None, None, Some("not-an-email".into()));

        assert!(result.is_err());
    }

    #[test]
    fn test_更新は指定した項目だけを送る() {
        let update = StudentUpdate::new()
            .last_name("Mwangi")
            .unwrap()
            .status(StudentStatus::Transferred);

        let json = serde_json::to_value(&update).unwrap();

        assert_eq!(json, json!({ "last_name": "Mwangi", "status": "transferred" }));
        assert!(!update.is_empty());
        assert!(StudentUpdate::new().is_empty());
    }

    #[test]
    fn test_取り込み結果は件数の別名と文字列を受け付ける() {
        let result: StudentImportResult = serde_json::from_value(json!({
            "created": "12",
            "errors": [{ "row": 4, "message": "Duplicate admission number" }]
        }))
        .unwrap();

        assert_eq!(result.imported, 12);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_絞り込み条件は指定した項目だけをクエリにする() {
        let filter = StudentFilter {
            page:     PageRequest::new(2, 20),
            search:   Some("  ".to_string()),
            class_id: Some(ClassId::new(4)),
            status:   Some(StudentStatus::Graduated),
        };

        let query = filter.to_query();

        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "20".to_string()),
                ("class_id".to_string(), "4".to_string()),
                ("status".to_string(), "graduated".to_string()),
            ]
        );
    }
}
