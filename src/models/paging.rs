//! Pagination types
//!
//! Offset pagination (`ListParams`/`PagedResult`) for small admin listings,
//! and the composite value cursor used by lesson listing, which stays stable
//! under concurrent inserts and anchor deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pagination parameters for offset-based list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries.
    ///
    /// Widens before multiplying: params deserialized straight into the
    /// struct bypass `new()`'s clamps, and the product of two large `u32`s
    /// must not wrap.
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 10,
        }
    }
}

/// Composite cursor for lesson listing.
///
/// Carries the anchor row's `(start_at, id)` VALUES rather than an id to be
/// looked up at read time: rows strictly after the cursor in
/// `(start_at, id)` order form the next page, so a deleted anchor still
/// yields the correct page instead of silently restarting from the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonCursor {
    /// Anchor row's start time
    pub start_at: DateTime<Utc>,
    /// Anchor row's id, breaking ties between equal start times
    pub id: i64,
}

impl LessonCursor {
    /// Create a new cursor from anchor values
    pub fn new(start_at: DateTime<Utc>, id: i64) -> Self {
        Self { start_at, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params() {
        let params = ListParams::new(1, 10);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 10);

        let params = ListParams::new(3, 5);
        assert_eq!(params.offset(), 10);
        assert_eq!(params.limit(), 5);

        // Page 0 becomes 1, per_page clamped to 100
        let params = ListParams::new(0, 200);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
    }

    #[test]
    #[allow(arithmetic_overflow)]
    fn test_offset_does_not_overflow_on_unclamped_params() {
        // Built directly, as deserialization would, skipping new()'s clamps
        let params = ListParams {
            page: u32::MAX,
            per_page: u32::MAX,
        };
        let expected = (u32::MAX as i64 - 1) * u32::MAX as i64;
        assert_eq!(params.offset(), expected);
    }

    #[test]
    fn test_paged_result() {
        let params = ListParams::new(1, 10);
        let result = PagedResult::new(vec![1, 2, 3, 4, 5], 25, &params);

        assert_eq!(result.len(), 5);
        assert_eq!(result.total_pages(), 3);
        assert!(result.has_next());
        assert!(!result.has_prev());

        let params = ListParams::new(3, 10);
        let result = PagedResult::new(vec![21, 22, 23, 24, 25], 25, &params);
        assert!(!result.has_next());
        assert!(result.has_prev());
    }

    #[test]
    fn test_cursor_ordering_ties_break_on_id() {
        let t = Utc::now();
        let a = LessonCursor::new(t, 1);
        let b = LessonCursor::new(t, 2);
        assert_ne!(a, b);
        assert_eq!(a.start_at, b.start_at);
    }
}
