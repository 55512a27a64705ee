//! Student model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Student entity
///
/// A student is the enrollment-facing profile of a user account; the
/// enrollment number is the stable natural key used by batch imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier
    pub id: i64,
    /// Backing user account ID
    pub user_id: i64,
    /// School-issued enrollment number (unique)
    pub enrollment_number: String,
    /// Grade level (1-12)
    pub grade_level: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentInput {
    /// Backing user account ID
    pub user_id: i64,
    /// School-issued enrollment number
    pub enrollment_number: String,
    /// Grade level
    pub grade_level: i32,
}

impl CreateStudentInput {
    /// Create a new CreateStudentInput
    pub fn new(user_id: i64, enrollment_number: String, grade_level: i32) -> Self {
        Self {
            user_id,
            enrollment_number,
            grade_level,
        }
    }
}
