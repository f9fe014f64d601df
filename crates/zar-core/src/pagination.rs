//! Pagination envelope shared by every list endpoint.

use serde::{Deserialize, Serialize};

/// Largest page any list endpoint will serve.
pub const MAX_PAGE_LIMIT: i64 = 64;

/// Query parameters accepted by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    MAX_PAGE_LIMIT
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: MAX_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl PageParams {
    /// Clamp to the contract: `1 ≤ limit ≤ 64`, `offset ≥ 0`.
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
            offset: self.offset.max(0),
        }
    }
}

/// `{total, limit, offset, page, pages, results}` response shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub page: i64,
    pub pages: i64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Build the envelope; `page` and `pages` are derived.
    pub fn new(total: i64, params: PageParams, results: Vec<T>) -> Self {
        let params = params.clamped();
        Self {
            total,
            limit: params.limit,
            offset: params.offset,
            page: params.offset / params.limit + 1,
            pages: (total + params.limit - 1) / params.limit,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_page_numbers() {
        let page = Page::new(130, PageParams { limit: 64, offset: 64 }, vec![1, 2]);
        assert_eq!(page.page, 2);
        assert_eq!(page.pages, 3);
    }

    #[test]
    fn clamps_oversized_limit() {
        let params = PageParams { limit: 500, offset: -3 }.clamped();
        assert_eq!(params.limit, MAX_PAGE_LIMIT);
        assert_eq!(params.offset, 0);
    }

    #[test]
    fn empty_listing_is_page_one() {
        let page: Page<i32> = Page::new(0, PageParams::default(), vec![]);
        assert_eq!(page.page, 1);
        assert_eq!(page.pages, 0);
    }
}
