//! Course model
//!
//! This module provides:
//! - `Course` entity with soft deletion via `deleted_at`
//! - `CourseStatus` enum
//! - Input types for creating and updating courses
//! - `CourseFilter` for the dynamic retrieve query

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Course entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier
    pub id: i64,
    /// Course name
    pub name: String,
    /// Subject (e.g. "math", "english")
    pub subject: String,
    /// Target grade level
    pub grade_level: i32,
    /// Lifecycle status
    pub status: CourseStatus,
    /// Sort weight for listings (lower = earlier)
    #[serde(default)]
    pub display_order: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp; a set value hides the course from listings
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Course {
    /// Check whether the course has been soft deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Course lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    /// Being authored, not yet open for enrollment
    #[default]
    Draft,
    /// Open for enrollment and teaching
    Active,
    /// No longer taught, kept for records
    Archived,
}

impl CourseStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Draft => "draft",
            CourseStatus::Active => "active",
            CourseStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(CourseStatus::Draft),
            "active" => Some(CourseStatus::Active),
            "archived" => Some(CourseStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseInput {
    /// Course name
    pub name: String,
    /// Subject
    pub subject: String,
    /// Target grade level
    pub grade_level: i32,
    /// Lifecycle status (defaults to Draft)
    pub status: Option<CourseStatus>,
    /// Sort weight (defaults to 0)
    pub display_order: Option<i32>,
}

impl CreateCourseInput {
    /// Create a new CreateCourseInput
    pub fn new(name: String, subject: String, grade_level: i32) -> Self {
        Self {
            name,
            subject,
            grade_level,
            status: None,
            display_order: None,
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: CourseStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the sort weight
    pub fn with_display_order(mut self, display_order: i32) -> Self {
        self.display_order = Some(display_order);
        self
    }
}

/// Input for updating an existing course
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCourseInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New subject (optional)
    pub subject: Option<String>,
    /// New grade level (optional)
    pub grade_level: Option<i32>,
    /// New status (optional)
    pub status: Option<CourseStatus>,
    /// New sort weight (optional)
    pub display_order: Option<i32>,
}

impl UpdateCourseInput {
    /// Create a new empty UpdateCourseInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the subject
    pub fn with_subject(mut self, subject: String) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Set the grade level
    pub fn with_grade_level(mut self, grade_level: i32) -> Self {
        self.grade_level = Some(grade_level);
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: CourseStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the sort weight
    pub fn with_display_order(mut self, display_order: i32) -> Self {
        self.display_order = Some(display_order);
        self
    }
}

/// Filter for `CourseRepository::retrieve`.
///
/// All fields are optional; set fields are ANDed together. Soft-deleted
/// courses are excluded unless `include_deleted` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseFilter {
    /// Restrict to these course IDs
    pub ids: Option<Vec<i64>>,
    /// Substring match against the course name
    pub keyword: Option<String>,
    /// Exact subject match
    pub subject: Option<String>,
    /// Exact grade level match
    pub grade_level: Option<i32>,
    /// Restrict to these statuses
    pub statuses: Option<Vec<CourseStatus>>,
    /// Include soft-deleted courses
    #[serde(default)]
    pub include_deleted: bool,
}

impl CourseFilter {
    /// Create a new empty filter (matches all non-deleted courses)
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given IDs
    pub fn with_ids(mut self, ids: Vec<i64>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Match names containing the keyword
    pub fn with_keyword(mut self, keyword: String) -> Self {
        self.keyword = Some(keyword);
        self
    }

    /// Restrict to a subject
    pub fn with_subject(mut self, subject: String) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Restrict to a grade level
    pub fn with_grade_level(mut self, grade_level: i32) -> Self {
        self.grade_level = Some(grade_level);
        self
    }

    /// Restrict to the given statuses
    pub fn with_statuses(mut self, statuses: Vec<CourseStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    /// Include soft-deleted courses in results
    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}
