// src/models/pagination.rs

use serde::Serialize;

pub const MAX_PAGE_SIZE: i64 = 100;

/// A resolved page window. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamps raw query values: page to at least 1, limit to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Saturates instead of overflowing for absurd page numbers, which then
    /// simply land past the last row.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of results plus the counts the client needs for navigation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            total_pages: (total + request.limit - 1) / request.limit,
            current_page: request.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_limit() {
        let req = PageRequest::new(Some(0), Some(1000), 10);
        assert_eq!(req, PageRequest { page: 1, limit: MAX_PAGE_SIZE });

        let req = PageRequest::new(None, None, 20);
        assert_eq!(req, PageRequest { page: 1, limit: 20 });
    }

    #[test]
    fn offset_and_total_pages() {
        let req = PageRequest::new(Some(3), Some(10), 10);
        assert_eq!(req.offset(), 20);

        let page = Page::new(vec![1, 2, 3], 21, req);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);

        let empty: Page<i32> = Page::new(vec![], 0, req);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let req = PageRequest::new(Some(i64::MAX), Some(10), 10);
        assert_eq!(req.page, i64::MAX);
        assert_eq!(req.offset(), i64::MAX);

        let req = PageRequest::new(Some(i64::MAX), Some(1), 10);
        assert_eq!(req.offset(), i64::MAX - 1);
    }
}
