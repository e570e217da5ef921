//! 日付フィールドのデシリアライズ補助
//!
//! バックエンドは日付を `"2024-03-01"` と `"2024-03-01T00:00:00.000Z"` の
//! どちらの形でも返すため、両方を [`NaiveDate`] として受け付ける。

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, de};

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// `Option<NaiveDate>` 用（`#[serde(default, deserialize_with = "...")]` と併用する）
pub mod optional_date {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_date(value)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("日付として解釈できません: {value:?}"))),
        }
    }
}

/// `NaiveDate` 用
pub mod date {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("日付として解釈できません: {raw:?}")))
    }
}

/// 件数用（`COUNT(*)` は文字列で返ることがある）
pub mod count {
    use serde_json::Value;

    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(0),
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| de::Error::custom(format!("件数として解釈できません: {n}"))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("件数として解釈できません: {s:?}"))),
            other => Err(de::Error::custom(format!("件数として解釈できません: {other}"))),
        }
    }
}
