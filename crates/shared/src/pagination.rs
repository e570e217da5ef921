//! # ページネーション
//!
//! 一覧エンドポイントのページ番号ベースのページネーション情報を表す。
//!
//! ## JSON 形式
//!
//! ```json
//! { "page": 2, "limit": 20, "total": 45, "totalPages": 3 }
//! ```
//!
//! `totalPages` は `total_pages` でも受け付け、省略された場合は
//! `ceil(total / limit)` で補う。

use serde::{Deserialize, Serialize};

/// ページネーション情報
///
/// # 不変条件
///
/// - `page >= 1`
/// - `limit > 0`
///
/// `total_pages == ceil(total / limit)` はバックエンドが保証すべき性質であり、
/// デコード時には検査しない（[`is_consistent`](Self::is_consistent) で確認できる）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPagination")]
pub struct Pagination {
    pub page:        u32,
    pub limit:       u32,
    pub total:       u64,
    pub total_pages: u32,
}

#[derive(Deserialize)]
struct RawPagination {
    page:        u32,
    limit:       u32,
    total:       u64,
    #[serde(default, alias = "totalPages")]
    total_pages: Option<u32>,
}

impl TryFrom<RawPagination> for Pagination {
    type Error = String;

    fn try_from(raw: RawPagination) -> Result<Self, Self::Error> {
        if raw.page == 0 {
            return Err("page は 1 以上である必要があります".to_string());
        }
        if raw.limit == 0 {
            return Err("limit は 1 以上である必要があります".to_string());
        }
        Ok(Self {
            page:        raw.page,
            limit:       raw.limit,
            total:       raw.total,
            total_pages: raw
                .total_pages
                .unwrap_or_else(|| Self::expected_total_pages(raw.total, raw.limit)),
        })
    }
}

impl Pagination {
    /// `total_pages` を計算して作成する
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: Self::expected_total_pages(total, limit),
        }
    }

    /// `ceil(total / limit)`（`limit == 0` のときは 0）
    pub fn expected_total_pages(total: u64, limit: u32) -> u32 {
        if limit == 0 {
            return 0;
        }
        u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
    }

    /// `total_pages == ceil(total / limit)` が成り立つか
    pub fn is_consistent(&self) -> bool {
        self.total_pages == Self::expected_total_pages(self.total, self.limit)
    }

    /// 次のページが存在するか
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// 前のページが存在するか
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// 一覧取得のページ指定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page:  u32,
    pub limit: u32,
}

impl PageRequest {
    /// 1 ページあたりの既定件数
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// クエリパラメータの組に変換する
    pub fn to_query(self) -> [(&'static str, String); 2] {
        [("page", self.page.to_string()), ("limit", self.limit.to_string())]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }
}

/// 一覧ページ
///
/// `pagination` が `None` の場合は単一ページの非ページネーション一覧として扱う。
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items:      Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Option<Pagination>) -> Self {
        Self { items, pagination }
    }

    /// 非ページネーション一覧
    pub fn unpaginated(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    /// 空の一覧
    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    /// 総ページ数（非ページネーション時は 1）
    pub fn total_pages(&self) -> u32 {
        self.pagination.map_or(1, |p| p.total_pages.max(1))
    }

    /// 次のページが存在するか
    pub fn has_next(&self) -> bool {
        self.pagination.is_some_and(|p| p.has_next())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 要素を変換する
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items:      self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
