//! Pagination for admin list pages

use serde::Deserialize;

/// Page size used when the settings table holds nothing usable
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Largest page size honoured; bigger values are cut down to it
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
    /// Rows per page
    pub page_size: i64,
}

impl Pagination {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// `?page=` query parameter
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

/// Clamp the requested page into `[1, total_pages]` and compute the offset
///
/// A non-positive `page_size` falls back to [`DEFAULT_PAGE_SIZE`]; larger
/// than [`MAX_PAGE_SIZE`] is capped.
///
/// # Examples
/// ```
/// use musicstream_web::pagination::calculate_pagination;
///
/// let p = calculate_pagination(250, 2, 100);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 100);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64, page_size: i64) -> Pagination {
    let page_size = if page_size > 0 { page_size.min(MAX_PAGE_SIZE) } else { DEFAULT_PAGE_SIZE };
    let total = total_results.max(0);
    let total_pages = total / page_size + i64::from(total % page_size != 0);
    let page = requested_page.max(1).min(total_pages.max(1));

    Pagination {
        page,
        total_pages,
        offset: (page - 1).saturating_mul(page_size),
        page_size,
    }
}
