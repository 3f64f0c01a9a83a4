//! # Pagination
//!
//! List endpoints answer either with a bare JSON array or with an envelope:
//!
//! ```json
//! {"data": [...], "total": 42, "page": 1, "limit": 20}
//! ```
//!
//! [`ListBody`] accepts both so callers only deal with [`Page`] or `Vec<T>`.

use serde::{Deserialize, Serialize};

use crate::api::client::RequestConfig;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size the client will ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    #[serde(alias = "items", alias = "results")]
    pub data: Vec<T>,
    /// Total number of items across all pages
    #[serde(default)]
    pub total: Option<u64>,
    /// 1-based page number
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size
    #[serde(default)]
    pub limit: Option<u32>,
}

impl<T> Page<T> {
    /// Number of pages, when the server reported enough to compute it.
    pub fn total_pages(&self) -> Option<u64> {
        let total = self.total?;
        let limit = self.limit.filter(|limit| *limit > 0)?;
        Some(total.div_ceil(u64::from(limit)))
    }

    /// Whether a later page exists.
    pub fn has_more(&self) -> bool {
        match (self.page, self.total_pages()) {
            (Some(page), Some(pages)) => u64::from(page) < pages,
            _ => false,
        }
    }
}

/// A list response in either shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    /// Bare JSON array
    Bare(Vec<T>),
    /// Paginated envelope
    Paged(Page<T>),
}

impl<T> ListBody<T> {
    /// The items, whatever the shape.
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) => items,
            ListBody::Paged(page) => page.data,
        }
    }

    /// A page, filling in what a bare array doesn't say from the request.
    pub fn into_page(self, request: PageRequest) -> Page<T> {
        match self {
            ListBody::Paged(page) => page,
            ListBody::Bare(items) => Page {
                data: items,
                total: None,
                page: Some(request.page),
                limit: Some(request.limit),
            },
        }
    }
}

/// Which page to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Page request with values clamped to `page >= 1` and
    /// `1 <= limit <= MAX_PAGE_SIZE`.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// The following page.
    pub fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self
        }
    }

    /// Add `page` and `limit` query parameters.
    pub fn apply(self, request: RequestConfig) -> RequestConfig {
        request.param("page", self.page).param("limit", self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_body_accepts_bare_array() {
        let body: ListBody<u32> = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(body.into_items(), vec![1, 2, 3]);
    }

    #[test]
    fn test_list_body_accepts_envelope_aliases() {
        let body: ListBody<u32> =
            serde_json::from_str(r#"{"items":[4,5],"total":12,"page":2,"limit":5}"#).unwrap();
        let page = body.into_page(PageRequest::default());
        assert_eq!(page.data, vec![4, 5]);
        assert_eq!(page.total_pages(), Some(3));
        assert!(page.has_more());
    }

    #[test]
    fn test_bare_array_page_uses_request() {
        let body: ListBody<u32> = serde_json::from_str("[]").unwrap();
        let page = body.into_page(PageRequest::new(3, 10));
        assert_eq!(page.page, Some(3));
        assert_eq!(page.limit, Some(10));
        assert!(!page.has_more());
    }

    #[test]
    fn test_last_page_has_no_more() {
        let page = Page {
            data: vec![1],
            total: Some(21),
            page: Some(2),
            limit: Some(20),
        };
        assert_eq!(page.total_pages(), Some(2));
        assert!(!page.has_more());
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(2, 500).limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::default().next().page, 2);
    }

    #[test]
    fn test_page_request_apply_adds_params() {
        let request = PageRequest::new(2, 50).apply(RequestConfig::get("/wallet/transactions"));
        assert_eq!(
            request.params,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "50".to_string())
            ]
        );
    }
}
