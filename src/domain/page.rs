//! Pagination types for listing endpoints.

use serde::{Deserialize, Serialize};

const MAX_PAGE_SIZE: i64 = 100;

/// Zero-based page request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_size() -> i64 {
    20
}

impl PageParams {
    pub fn new(page: i64, size: i64) -> Self {
        Self { page, size }
    }

    /// Effective limit, clamped to a sane upper bound.
    pub fn limit(&self) -> i64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.page.max(0) * self.limit()
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_size(),
        }
    }
}

/// One page of results plus total counts.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, params: PageParams, total_elements: i64) -> Self {
        let size = params.limit();
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };
        Self {
            content,
            page: params.page.max(0),
            size,
            total_elements,
            total_pages,
        }
    }

    /// Map page content, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        let params: PageParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 0);
        assert_eq!(params.size, 20);
    }

    #[test]
    fn test_page_params_clamped() {
        let params = PageParams::new(2, 1000);
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 200);

        let params = PageParams::new(0, 0);
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn test_page_totals() {
        let page = Page::new(vec![1, 2, 3], PageParams::new(0, 3), 7);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_elements, 7);

        let empty: Page<i32> = Page::new(vec![], PageParams::default(), 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2], PageParams::new(0, 2), 2);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.content, vec![10, 20]);
        assert_eq!(mapped.total_elements, 2);
    }
}
