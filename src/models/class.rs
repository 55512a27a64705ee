//! Class model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Class entity
///
/// A class is a cohort of students taking a course together, optionally
/// assigned to a teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    /// Unique identifier
    pub id: i64,
    /// Course this class teaches
    pub course_id: i64,
    /// Class name
    pub name: String,
    /// Assigned teacher user ID, if any
    #[serde(default)]
    pub teacher_id: Option<i64>,
    /// Maximum number of members (0 = unlimited)
    #[serde(default)]
    pub capacity: i32,
    /// Lifecycle status
    pub status: ClassStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Class lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    /// Running (default)
    #[default]
    Active,
    /// Finished, membership frozen
    Closed,
}

impl ClassStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Active => "active",
            ClassStatus::Closed => "closed",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(ClassStatus::Active),
            "closed" => Some(ClassStatus::Closed),
            _ => None,
        }
    }
}

/// Input for creating a new class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClassInput {
    /// Course this class teaches
    pub course_id: i64,
    /// Class name
    pub name: String,
    /// Assigned teacher user ID (optional)
    pub teacher_id: Option<i64>,
    /// Maximum number of members (defaults to 0 = unlimited)
    pub capacity: Option<i32>,
}

impl CreateClassInput {
    /// Create a new CreateClassInput
    pub fn new(course_id: i64, name: String) -> Self {
        Self {
            course_id,
            name,
            teacher_id: None,
            capacity: None,
        }
    }

    /// Set the teacher
    pub fn with_teacher_id(mut self, teacher_id: i64) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }

    /// Set the capacity
    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// Input for updating an existing class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClassInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New teacher (optional)
    pub teacher_id: Option<i64>,
    /// New capacity (optional)
    pub capacity: Option<i32>,
    /// New status (optional)
    pub status: Option<ClassStatus>,
}

impl UpdateClassInput {
    /// Create a new empty UpdateClassInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the teacher
    pub fn with_teacher_id(mut self, teacher_id: i64) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }

    /// Set the capacity
    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: ClassStatus) -> Self {
        self.status = Some(status);
        self
    }
}
