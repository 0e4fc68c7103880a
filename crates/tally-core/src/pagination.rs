//! # Pagination
//!
//! Offset/limit arithmetic for tenant-scoped list queries.
//!
//! ## Zero-Limit Policy
//! ```text
//! limit > 0 AND page > 0   → OFFSET (page-1)*limit LIMIT limit
//!                            total_pages = ceil(total / limit)
//! otherwise                → every tenant-scoped row
//!                            total_pages = 1 if total > 0 else 0
//! ```

use serde::{Deserialize, Serialize};

/// Requested page. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

/// Concrete OFFSET/LIMIT for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

impl Pagination {
    pub const fn new(page: i64, limit: i64) -> Self {
        Pagination { page, limit }
    }

    /// The window to apply, or `None` when the whole set is requested.
    pub fn window(&self) -> Option<PageWindow> {
        if self.limit > 0 && self.page > 0 {
            Some(PageWindow {
                offset: (self.page - 1).saturating_mul(self.limit),
                limit: self.limit,
            })
        } else {
            None
        }
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        match self.window() {
            Some(window) => {
                let total = total.max(0);
                total / window.limit + i64::from(total % window.limit != 0)
            }
            None if total > 0 => 1,
            None => 0,
        }
    }
}

/// One page of records with the totals of the unpaged set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total_records: i64,
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total_records: i64, pagination: Pagination) -> Self {
        Page {
            records,
            total_records,
            total_pages: pagination.total_pages(total_records),
            page: pagination.page,
            limit: pagination.limit,
        }
    }
}
