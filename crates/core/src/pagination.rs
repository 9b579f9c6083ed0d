//! Page-based pagination helpers shared by list endpoints.
//!
//! List endpoints accept `?page=&limit=` and respond with a
//! [`PageInfo`] block alongside the data.

use serde::Serialize;

/// Default page size when `limit` is omitted.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on `limit` for any list endpoint.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Clamp a 1-based page number.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Row offset for a 1-based page.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    (page - 1) * limit
}

/// Pagination metadata returned with list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl PageInfo {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// Resolved `(page, limit, offset)` triple from raw query values.
pub fn resolve(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = clamp_page(page);
    let limit = clamp_limit(limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    (page, limit, page_offset(page, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped_to_bounds() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
        assert_eq!(clamp_limit(Some(0), 20, 100), 1);
        assert_eq!(clamp_limit(Some(500), 20, 100), 100);
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some(-3)), 1);
        assert_eq!(page_offset(3, 20), 40);
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(PageInfo::new(1, 20, 0).pages, 0);
        assert_eq!(PageInfo::new(1, 20, 20).pages, 1);
        assert_eq!(PageInfo::new(1, 20, 21).pages, 2);
    }

    #[test]
    fn resolve_combines_defaults() {
        assert_eq!(resolve(None, None), (1, 20, 0));
        assert_eq!(resolve(Some(2), Some(10)), (2, 10, 10));
    }
}
