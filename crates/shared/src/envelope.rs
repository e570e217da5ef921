//! # 一覧レスポンスの形状正規化
//!
//! バックエンドの一覧エンドポイントは、エンドポイントごとに次のいずれかの形で返す:
//!
//! ```text
//! [ ... ]
//! { "<key>": [ ... ], "pagination"?: { ... } }
//! { "data": [ ... ] }
//! { "data": { "<key>": [ ... ], "pagination"?: { ... } } }
//! { "data": { "data": [ ... ], "pagination"?: { ... } } }
//! ```
//!
//! 探索は先にマッチしたものを採用する:
//!
//! 1. `<key>` が配列ならそれを採用し、兄弟の `pagination` を添える
//! 2. `data` があれば一段潜って同じ規則を適用する（潜った先では `data` 自体も一覧キーになる）。
//!    潜った先に `pagination` が無ければ `data` の兄弟の `pagination` を使う
//! 3. 値そのものが配列ならそれを採用する
//! 4. いずれにも当たらない
//!
//! 4 の扱いだけが二つの入口で異なる:
//!
//! - [`normalize_list`]: 決して失敗せず、空の一覧に縮退する
//! - [`decode_list`] / [`decode_page`]: [`DecodeError`] を返す。API モジュールの境界ではこちらを使う

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::pagination::{Page, Pagination};

const DATA_KEY: &str = "data";
const PAGINATION_KEY: &str = "pagination";

/// `data` を潜る最大段数（`{ data: { data: [...] } }` まで）
const MAX_DATA_DEPTH: usize = 2;

/// 一覧レスポンスのデコードエラー
#[derive(Debug, Error)]
pub enum DecodeError {
    /// どの形状にも一致しない
    #[error("レスポンスに `{key}` の一覧が見つかりません")]
    UnrecognizedShape { key: String },

    /// 一覧の要素を解釈できない
    #[error("`{key}` の {index} 番目の要素を解釈できません: {source}")]
    Item {
        key:    String,
        index:  usize,
        #[source]
        source: serde_json::Error,
    },

    /// ページネーション情報を解釈できない
    #[error("ページネーション情報を解釈できません: {0}")]
    Pagination(#[source] serde_json::Error),

    /// 単一レコードを解釈できない
    #[error("`{key}` のレコードを解釈できません: {source}")]
    Record {
        key:    String,
        #[source]
        source: serde_json::Error,
    },
}

/// 一覧として返されるレコード型
///
/// レコード型ごとにレスポンス中の一覧キーを宣言し、
/// [`decode_page`] でエンドポイント専用のデコーダとして使う。
pub trait ListResource: DeserializeOwned {
    /// 一覧のキー（例: `"students"`）
    const LIST_KEY: &'static str;

    /// 単一レコードのキー（例: `"student"`）
    const RECORD_KEY: &'static str;
}

/// 正規化済みの一覧（未型付け）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedList {
    pub items:      Vec<Value>,
    pub pagination: Option<Pagination>,
}

struct Located<'a> {
    items:      &'a [Value],
    pagination: Option<&'a Value>,
}

fn locate<'a>(value: &'a Value, key: &str, depth: usize) -> Option<Located<'a>> {
    if let Some(object) = value.as_object() {
        let sibling_pagination = object.get(PAGINATION_KEY).filter(|p| !p.is_null());

        if let Some(Value::Array(items)) = object.get(key) {
            return Some(Located {
                items,
                pagination: sibling_pagination,
            });
        }

        if depth < MAX_DATA_DEPTH
            && let Some(inner) = object.get(DATA_KEY)
            && let Some(mut located) = locate(inner, key, depth + 1)
        {
            if located.pagination.is_none() {
                located.pagination = sibling_pagination;
            }
            return Some(located);
        }

        return None;
    }

    value.as_array().map(|items| Located {
        items,
        pagination: None,
    })
}

/// 一覧レスポンスを寛容に正規化する
///
/// 想定外の形状や不正な `pagination` は空の一覧 / `None` に縮退し、決して失敗しない。
pub fn normalize_list(value: &Value, key: &str) -> NormalizedList {
    let Some(located) = locate(value, key, 0) else {
        return NormalizedList::default();
    };

    NormalizedList {
        items:      located.items.to_vec(),
        pagination: located
            .pagination
            .and_then(|p| parse_pagination(p).ok()),
    }
}

/// 一覧レスポンスを型付きでデコードする
///
/// 形状の探索は [`normalize_list`] と同じ。どの形状にも一致しない場合や、
/// 要素・ページネーションを解釈できない場合はエラーを返す。
pub fn decode_list<T: DeserializeOwned>(value: &Value, key: &str) -> Result<Page<T>, DecodeError> {
    let located = locate(value, key, 0).ok_or_else(|| DecodeError::UnrecognizedShape {
        key: key.to_string(),
    })?;

    let items = located
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            T::deserialize(item).map_err(|source| DecodeError::Item {
                key: key.to_string(),
                index,
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pagination = located
        .pagination
        .map(parse_pagination)
        .transpose()
        .map_err(DecodeError::Pagination)?;

    Ok(Page::new(items, pagination))
}

/// [`ListResource`] の宣言に従って一覧をデコードする
pub fn decode_page<T: ListResource>(value: &Value) -> Result<Page<T>, DecodeError> {
    decode_list(value, T::LIST_KEY)
}

/// 単一レコードのレスポンスをデコードする
///
/// `{ "<key>": {...} }`、`{ "data": { "<key>": {...} } }`、`{ "data": {...} }`
/// またはレコードそのもののいずれも受け付ける。
pub fn decode_record<T: DeserializeOwned>(value: &Value, key: &str) -> Result<T, DecodeError> {
    let target = locate_record(value, key, 0);
    T::deserialize(target).map_err(|source| DecodeError::Record {
        key: key.to_string(),
        source,
    })
}

fn locate_record<'a>(value: &'a Value, key: &str, depth: usize) -> &'a Value {
    match value.get(key) {
        Some(inner) if inner.is_object() => inner,
        _ => match value.get(DATA_KEY) {
            Some(inner) if depth < MAX_DATA_DEPTH && inner.is_object() => {
                locate_record(inner, key, depth + 1)
            }
            _ => value,
        },
    }
}

fn parse_pagination(value: &Value) -> Result<Pagination, serde_json::Error> {
    Pagination::deserialize(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Student {
        id:   i64,
        name: String,
    }

    impl ListResource for Student {
        const LIST_KEY: &'static str = "students";
        const RECORD_KEY: &'static str = "student";
    }

    fn students_json() -> Value {
        json!([{ "id": 1, "name": "Aiko" }, { "id": 2, "name": "Kenji" }])
    }

    fn pagination_json() -> Value {
        json!({ "page": 1, "limit": 2, "total": 3, "totalPages": 2 })
    }

    fn expected_students() -> Vec<Student> {
        vec![
            Student {
                id:   1,
                name: "Aiko".to_string(),
            },
            Student {
                id:   2,
                name: "Kenji".to_string(),
            },
        ]
    }

    #[rstest]
    #[case::bare_array(students_json(), false)]
    #[case::keyed(json!({ "students": students_json() }), false)]
    #[case::keyed_with_pagination(
        json!({ "students": students_json(), "pagination": pagination_json() }),
        true
    )]
    #[case::data_array(json!({ "data": students_json() }), false)]
    #[case::data_array_with_sibling_pagination(
        json!({ "data": students_json(), "pagination": pagination_json() }),
        true
    )]
    #[case::data_keyed(
        json!({ "data": { "students": students_json(), "pagination": pagination_json() } }),
        true
    )]
    #[case::data_data(
        json!({ "data": { "data": students_json(), "pagination": pagination_json() } }),
        true
    )]
    #[case::success_envelope(
        json!({ "success": true, "data": { "students": students_json(), "pagination": pagination_json() } }),
        true
    )]
    fn test_どの形状からも同じ一覧を取り出す(#[case] body: Value, #[case] paginated: bool) {
        let expected_pagination = paginated.then(|| Pagination::new(1, 2, 3));

        let normalized = normalize_list(&body, "students");
        assert_eq!(normalized.items, students_json().as_array().unwrap().clone());
        assert_eq!(normalized.pagination, expected_pagination);

        let page: Page<Student> = decode_page(&body).unwrap();
        assert_eq!(page.items, expected_students());
        assert_eq!(page.pagination, expected_pagination);
    }

    #[rstest]
    #[case::null(Value::Null)]
    #[case::number(json!(42))]
    #[case::string(json!("students"))]
    #[case::other_key(json!({ "classes": [] }))]
    #[case::key_not_array(json!({ "students": { "id": 1 } }))]
    #[case::data_null(json!({ "data": null }))]
    #[case::too_deep(json!({ "data": { "data": { "data": [] } } }))]
    fn test_想定外の形状は正規化で空になりデコードでエラーになる(#[case] body: Value) {
        let normalized = normalize_list(&body, "students");
        assert_eq!(normalized, NormalizedList::default());

        let result = decode_page::<Student>(&body);
        assert!(matches!(
            result,
            Err(DecodeError::UnrecognizedShape { key }) if key == "students"
        ));
    }

    #[test]
    fn test_キーの一致がdataより優先される() {
        let body = json!({
            "students": [{ "id": 9, "name": "Top" }],
            "data": [{ "id": 1, "name": "Nested" }]
        });

        let page: Page<Student> = decode_page(&body).unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 9);
    }

    #[test]
    fn test_不正なpaginationは正規化でnoneになりデコードでエラーになる() {
        let body = json!({ "students": students_json(), "pagination": { "page": "one" } });

        assert_eq!(normalize_list(&body, "students").pagination, None);
        assert!(matches!(
            decode_page::<Student>(&body),
            Err(DecodeError::Pagination(_))
        ));
    }

    #[test]
    fn test_解釈できない要素は位置付きのエラーになる() {
        let body = json!({ "students": [{ "id": 1, "name": "ok" }, { "id": "x" }] });

        let result = decode_page::<Student>(&body);

        assert!(matches!(result, Err(DecodeError::Item { index: 1, .. })));
    }

    #[test]
    fn test_要素の解釈に失敗しても正規化は値をそのまま返す() {
        let body = json!({ "students": [{ "id": "x" }] });

        let normalized = normalize_list(&body, "students");

        assert_eq!(normalized.items, vec![json!({ "id": "x" })]);
    }

    #[rstest]
    #[case::keyed(json!({ "student": { "id": 1, "name": "Aiko" } }))]
    #[case::data_keyed(json!({ "data": { "student": { "id": 1, "name": "Aiko" } } }))]
    #[case::data_record(json!({ "data": { "id": 1, "name": "Aiko" } }))]
    #[case::bare(json!({ "id": 1, "name": "Aiko" }))]
    fn test_単一レコードを取り出す(#[case] body: Value) {
        let student: Student = decode_record(&body, Student::RECORD_KEY).unwrap();

        assert_eq!(student, expected_students()[0]);
    }
}
