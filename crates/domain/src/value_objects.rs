//! # 共通値オブジェクト
//!
//! 複数のレコードで共有される値オブジェクトを定義する。
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Amount`] | `i64`（最小通貨単位） | 学費・支払額 |
//! | [`PersonName`] | `String` | 生徒・保護者の氏名 |
//! | [`AdmissionNumber`] | `String` | 学籍番号 |
//! | [`ClassName`] | `String` | クラス名 |
//! | [`FeeName`] | `String` | 費目名 |
//! | [`SchoolName`] | `String` | 学校名 |
//! | [`Reason`] | `String` | 支払い取消理由 |
//! | [`Email`] | `String` | メールアドレス |
//! | [`Password`] | `String` | パスワード（Debug マスク） |

use std::{
    fmt,
    iter::Sum,
    ops::{Add, Sub},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::DomainError;

// =========================================================================
// Amount（金額）
// =========================================================================

/// 金額（値オブジェクト）
///
/// 最小通貨単位（セント等）の整数で保持し、浮動小数点の誤差を持ち込まない。
///
/// JSON では小数 2 桁の数値としてシリアライズする。デシリアライズは数値と
/// 数値文字列（DECIMAL 列は文字列で返る）の両方を受け付ける。
///
/// # 使用例
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use schoolfee_domain::value_objects::Amount;
///
/// let fee = Amount::parse("1500.50")?;
/// let paid = Amount::from_minor(50_000);
///
/// assert_eq!((fee - paid).to_string(), "1000.50");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// 最小通貨単位から作成する
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// 通貨単位の値から作成する（小数第 3 位以下は四捨五入）
    pub fn from_major(major: f64) -> Result<Self, DomainError> {
        if !major.is_finite() {
            return Err(DomainError::Validation(
                "金額は有限の数値である必要があります".to_string(),
            ));
        }
        Ok(Self((major * 100.0).round() as i64))
    }

    /// DECIMAL 形式の文字列から作成する（小数第 3 位で四捨五入）
    ///
    /// 浮動小数点を経由せず、整数部と小数部の桁から直接最小通貨単位を求める。
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction)
        {
            return Err(DomainError::Validation(format!(
                "金額として解釈できません: {value:?}"
            )));
        }

        let cents = fraction.bytes().chain(std::iter::repeat(b'0')).take(2);
        let round_up = fraction.as_bytes().get(2).is_some_and(|&b| b >= b'5');
        let minor = whole
            .bytes()
            .chain(cents)
            .try_fold(0_i64, |acc, b| {
                acc.checked_mul(10)?.checked_add(i64::from(b - b'0'))
            })
            .and_then(|m| if round_up { m.checked_add(1) } else { Some(m) })
            .ok_or_else(|| DomainError::Validation(format!("金額が大きすぎます: {value:?}")))?;

        Ok(Self(if negative { -minor } else { minor }))
    }

    /// 0 より大きい金額のみ受け付ける
    pub fn positive(self) -> Result<Self, DomainError> {
        if self.0 <= 0 {
            return Err(DomainError::Validation(
                "金額は 0 より大きい値である必要があります".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn minor_units(self) -> i64 {
        self.0
    }

    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// 0 を下回らない減算
    pub fn saturating_sub_floor(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).max(0))
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl de::Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or a numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                Ok(Amount(v.saturating_mul(100)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                let v = i64::try_from(v).map_err(E::custom)?;
                self.visit_i64(v)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                Amount::from_major(v).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                Amount::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// `part / whole * 100` を小数第 1 位で丸める（`whole` が 0 以下なら 0）
pub fn percentage(part: Amount, whole: Amount) -> f64 {
    if whole.0 <= 0 {
        return 0.0;
    }
    let ratio = part.0 as f64 / whole.0 as f64 * 100.0;
    (ratio * 10.0).round() / 10.0
}

// =========================================================================
// 必須入力の文字列
// =========================================================================

define_required_text! {
    /// 氏名（生徒・保護者）
    pub struct PersonName {
        label: "氏名",
        max_length: 100,
    }
}

define_required_text! {
    /// 学籍番号
    pub struct AdmissionNumber {
        label: "学籍番号",
        max_length: 50,
    }
}

define_required_text! {
    /// クラス名
    pub struct ClassName {
        label: "クラス名",
        max_length: 100,
    }
}

define_required_text! {
    /// 費目名
    pub struct FeeName {
        label: "費目名",
        max_length: 150,
    }
}

define_required_text! {
    /// 学校名
    pub struct SchoolName {
        label: "学校名",
        max_length: 200,
    }
}

define_required_text! {
    /// 理由（支払い取消など）
    pub struct Reason {
        label: "理由",
        max_length: 500,
    }
}

define_required_text! {
    /// パスワード
    pub struct Password {
        label: "パスワード",
        max_length: 256,
        secret: true,
    }
}

// =========================================================================
// Email（メールアドレス）
// =========================================================================

/// メールアドレス（値オブジェクト）
///
/// `local@domain` の形であることだけを確認する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `@` の前後が空でない
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 任意入力の文字列を正規化する（trim 後に空なら `None`）
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!(1500), 150_000)]
    #[case(json!(1500.5), 150_050)]
    #[case(json!("1500.50"), 150_050)]
    #[case(json!(" 99.999 "), 10_000)]
    #[case(json!(0), 0)]
    fn test_数値と数値文字列の両方から金額をデシリアライズする(
        #[case] value: serde_json::Value,
        #[case] expected_minor: i64,
    ) {
        let amount: Amount = serde_json::from_value(value).unwrap();

        assert_eq!(amount.minor_units(), expected_minor);
    }

    #[rstest]
    #[case(json!("abc"))]
    #[case(json!(null))]
    #[case(json!(true))]
    fn test_数値でない金額はエラー(#[case] value: serde_json::Value) {
        assert!(serde_json::from_value::<Amount>(value).is_err());
    }

    #[test]
    fn test_金額は小数2桁の数値としてシリアライズされる() {
        let json = serde_json::to_value(Amount::from_minor(123_456)).unwrap();

        assert_eq!(json, json!(1234.56));
    }

    #[rstest]
    #[case(150_050, "1500.50")]
    #[case(5, "0.05")]
    #[case(-1_999, "-19.99")]
    fn test_金額の表示形式(#[case] minor: i64, #[case] expected: &str) {
        assert_eq!(Amount::from_minor(minor).to_string(), expected);
    }

    #[rstest]
    #[case("1500.50", 150_050)]
    #[case("5.", 500)]
    #[case(".5", 50)]
    #[case("+3", 300)]
    #[case("-19.99", -1_999)]
    #[case("0.005", 1)]
    #[case("0.0049", 0)]
    #[case("90071992547409.93", 9_007_199_254_740_993)]
    #[case("92233720368547758.07", i64::MAX)]
    fn test_文字列の金額を桁どおりに解釈する(#[case] input: &str, #[case] expected_minor: i64) {
        assert_eq!(Amount::parse(input).unwrap().minor_units(), expected_minor);
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("-")]
    #[case("1.2.3")]
    #[case("1e3")]
    #[case("--1")]
    #[case("12a")]
    #[case("92233720368547758.08")]
    fn test_解釈できない文字列の金額はエラー(#[case] input: &str) {
        assert!(Amount::parse(input).is_err());
    }

    #[test]
    fn test_positiveは0以下を拒否する() {
        assert!(Amount::ZERO.positive().is_err());
        assert!(Amount::from_minor(-1).positive().is_err());
        assert!(Amount::from_minor(1).positive().is_ok());
    }

    #[test]
    fn test_saturating_sub_floorは負にならない() {
        let result = Amount::from_minor(100).saturating_sub_floor(Amount::from_minor(300));

        assert_eq!(result, Amount::ZERO);
    }

    #[test]
    fn test_金額の合計() {
        let total: Amount = [100, 250, 50].into_iter().map(Amount::from_minor).sum();

        assert_eq!(total, Amount::from_minor(400));
    }

    #[rstest]
    #[case(0, 0, 0.0)]
    #[case(50, 0, 0.0)]
    #[case(1, 3, 33.3)]
    #[case(2, 3, 66.7)]
    #[case(300, 300, 100.0)]
    fn test_percentageは小数第1位で丸める(
        #[case] part: i64,
        #[case] whole: i64,
        #[case] expected: f64,
    ) {
        let result = percentage(Amount::from_minor(part), Amount::from_minor(whole));

        assert!((result - expected).abs() < f64::EPSILON, "{result} != {expected}");
    }

    #[test]
    fn test_必須文字列は前後の空白を除去する() {
        let name = PersonName::new("  Wanjiru Kamau ").unwrap();

        assert_eq!(name.as_str(), "Wanjiru Kamau");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_必須文字列の空はエラー(#[case] value: &str) {
        let result = FeeName::new(value);

        assert_eq!(
            result,
            Err(DomainError::Validation("費目名は必須です".to_string()))
        );
    }

    #[test]
    fn test_必須文字列の最大長超過はエラー() {
        let result = AdmissionNumber::new("x".repeat(51));

        assert!(result.is_err());
    }

    #[test]
    fn test_パスワードのdebug出力はマスクされる() {
        let password = Password::new("hunter2").unwrap();

        let debug = format!("{password:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[rstest]
    #[case("bursar@school.example")]
    #[case("  parent@example.com  ")]
    fn test_正しいメールアドレス(#[case] value: &str) {
        assert!(Email::new(value).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("no-at-mark")]
    #[case("@example.com")]
    #[case("user@")]
    fn test_不正なメールアドレス(#[case] value: &str) {
        assert!(Email::new(value).is_err());
    }

    #[test]
    fn test_optional_textは空白のみをnoneにする() {
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(optional_text(Some(" a ".to_string())), Some("a".to_string()));
        assert_eq!(optional_text(None), None);
    }
}
