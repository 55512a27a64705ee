//! Book model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Book entity
///
/// Textbooks are imported from publisher catalogs, so the ISBN is the
/// natural key used by batch upserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier
    pub id: i64,
    /// ISBN (unique)
    pub isbn: String,
    /// Book title
    pub name: String,
    /// Subject
    pub subject: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Create a new book; the id is assigned by the database
    pub fn new(isbn: String, name: String, subject: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            isbn,
            name,
            subject,
            created_at: now,
            updated_at: now,
        }
    }
}
