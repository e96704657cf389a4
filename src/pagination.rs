use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::models::BookName;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_SIZE: i64 = 5;

/// 1-based page number and page size, both positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Self {
        PageRequest { page, size }
    }

    /// Number of rows to skip before the first row of this page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: DEFAULT_PAGE,
            size: DEFAULT_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub previous_page: Option<i64>,
    pub page: i64,
    pub next_page: Option<i64>,
    pub total_pages: i64,
    pub total_results: i64,
    pub result: Vec<BookName>,
}

impl PageResult {
    pub fn new(request: PageRequest, total_results: i64, result: Vec<BookName>) -> Self {
        let page = request.page;
        let total_pages = total_pages(total_results, request.size);

        // A page past the end still points back at the last page that has rows.
        let previous_page = if page > 1 {
            Some((page - 1).min(total_pages))
        } else {
            None
        };
        let next_page = if page < total_pages {
            Some(page + 1)
        } else {
            None
        };

        PageResult {
            previous_page,
            page,
            next_page,
            total_pages,
            total_results,
            result,
        }
    }
}

pub fn total_pages(total_results: i64, size: i64) -> i64 {
    if size <= 0 {
        return 0;
    }
    total_results / size + i64::from(total_results % size != 0)
}

/// Outcome of a catalog listing. An empty selection carries no page metadata and
/// serializes as a bare empty array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Page(PageResult),
    Empty,
}

impl Serialize for Listing {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Listing::Page(page) => page.serialize(serializer),
            Listing::Empty => serializer.serialize_seq(Some(0))?.end(),
        }
    }
}
