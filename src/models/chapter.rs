//! Chapter model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chapter entity
///
/// Chapters belong to a book and are ordered by `display_order`. The
/// `(book_id, name)` pair is unique and acts as the natural key for
/// batch upserts during catalog imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Unique identifier
    pub id: i64,
    /// Owning book ID
    pub book_id: i64,
    /// Chapter name (unique within a book)
    pub name: String,
    /// Position within the book (lower = earlier)
    pub display_order: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    /// Create a new chapter; the id is assigned by the database
    pub fn new(book_id: i64, name: String, display_order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            book_id,
            name,
            display_order,
            created_at: now,
            updated_at: now,
        }
    }
}
