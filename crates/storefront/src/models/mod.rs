//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and double as JSON response bodies
//! (camelCase). Input types that need validation live next to the route that
//! accepts them.

pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod session;
pub mod user;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use session::{CurrentUser, keys as session_keys};

/// Largest page size any listing accepts.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Out-of-range pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page must be at least 1")]
    Page,

    #[error("limit must be between 1 and {MAX_PAGE_SIZE}")]
    Limit,
}

/// A validated page request (`page` is 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Build a page request from optional query parameters.
    ///
    /// Missing values fall back to page 1 and `default_limit`.
    ///
    /// # Errors
    ///
    /// Returns `PageError` if `page` is 0 or `limit` is outside `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Result<Self, PageError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(default_limit);
        if page == 0 {
            return Err(PageError::Page);
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(PageError::Limit);
        }
        Ok(Self { page, limit })
    }

    /// The first `limit` rows.
    #[must_use]
    pub const fn first(limit: u32) -> Self {
        Self { page: 1, limit }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    #[must_use]
    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }
}

/// Pagination metadata returned with every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl PageInfo {
    #[must_use]
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = i64::from(request.limit);
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            items,
            pagination: PageInfo::new(request, total),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        assert_eq!(
            PageRequest::new(None, None, 12).unwrap(),
            PageRequest { page: 1, limit: 12 }
        );
        assert_eq!(
            PageRequest::new(Some(3), Some(50), 12).unwrap(),
            PageRequest { page: 3, limit: 50 }
        );
    }

    #[test]
    fn test_page_request_rejects_out_of_range() {
        assert_eq!(PageRequest::new(Some(0), None, 12), Err(PageError::Page));
        assert_eq!(PageRequest::new(None, Some(0), 12), Err(PageError::Limit));
        assert_eq!(PageRequest::new(None, Some(51), 12), Err(PageError::Limit));
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::first(10).offset(), 0);
        assert_eq!(PageRequest::new(Some(4), Some(10), 10).unwrap().offset(), 30);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let request = PageRequest::first(10);
        assert_eq!(PageInfo::new(request, 0).total_pages, 0);
        assert_eq!(PageInfo::new(request, 10).total_pages, 1);
        assert_eq!(PageInfo::new(request, 11).total_pages, 2);
    }
}
