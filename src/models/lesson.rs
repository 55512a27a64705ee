//! Lesson model
//!
//! This module provides:
//! - `Lesson` entity with soft deletion via `deleted_at`
//! - `SchedulingStatus` enum
//! - Input types for creating and updating lessons
//! - `LessonPage`, the result of cursor-paginated listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::paging::LessonCursor;

/// Lesson entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier
    pub id: i64,
    /// Course this lesson belongs to
    pub course_id: i64,
    /// Assigned teacher user ID, if any
    #[serde(default)]
    pub teacher_id: Option<i64>,
    /// Lesson name
    pub name: String,
    /// Scheduled start time
    pub start_at: DateTime<Utc>,
    /// Scheduled end time, if known
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    /// Scheduling status
    pub scheduling_status: SchedulingStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp; a set value hides the lesson from listings
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Lesson {
    /// Check whether the lesson has been soft deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The cursor value a page ending at this lesson hands back
    pub fn cursor(&self) -> LessonCursor {
        LessonCursor::new(self.start_at, self.id)
    }
}

/// Lesson scheduling status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingStatus {
    /// Scheduled but not yet taught (default)
    #[default]
    Scheduled,
    /// Taught to completion
    Completed,
    /// Canceled before being taught
    Canceled,
}

impl SchedulingStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingStatus::Scheduled => "scheduled",
            SchedulingStatus::Completed => "completed",
            SchedulingStatus::Canceled => "canceled",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "scheduled" => Some(SchedulingStatus::Scheduled),
            "completed" => Some(SchedulingStatus::Completed),
            "canceled" => Some(SchedulingStatus::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchedulingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLessonInput {
    /// Course this lesson belongs to
    pub course_id: i64,
    /// Lesson name
    pub name: String,
    /// Scheduled start time
    pub start_at: DateTime<Utc>,
    /// Scheduled end time (optional)
    pub end_at: Option<DateTime<Utc>>,
    /// Assigned teacher (optional)
    pub teacher_id: Option<i64>,
}

impl CreateLessonInput {
    /// Create a new CreateLessonInput
    pub fn new(course_id: i64, name: String, start_at: DateTime<Utc>) -> Self {
        Self {
            course_id,
            name,
            start_at,
            end_at: None,
            teacher_id: None,
        }
    }

    /// Set the end time
    pub fn with_end_at(mut self, end_at: DateTime<Utc>) -> Self {
        self.end_at = Some(end_at);
        self
    }

    /// Set the teacher
    pub fn with_teacher_id(mut self, teacher_id: i64) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }
}

/// Input for updating an existing lesson
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLessonInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New start time (optional)
    pub start_at: Option<DateTime<Utc>>,
    /// New end time (optional)
    pub end_at: Option<DateTime<Utc>>,
    /// New teacher (optional)
    pub teacher_id: Option<i64>,
    /// New scheduling status (optional)
    pub scheduling_status: Option<SchedulingStatus>,
}

impl UpdateLessonInput {
    /// Create a new empty UpdateLessonInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the start time
    pub fn with_start_at(mut self, start_at: DateTime<Utc>) -> Self {
        self.start_at = Some(start_at);
        self
    }

    /// Set the end time
    pub fn with_end_at(mut self, end_at: DateTime<Utc>) -> Self {
        self.end_at = Some(end_at);
        self
    }

    /// Set the scheduling status
    pub fn with_scheduling_status(mut self, status: SchedulingStatus) -> Self {
        self.scheduling_status = Some(status);
        self
    }
}

/// One page of cursor-paginated lessons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPage {
    /// Lessons in this page, ordered by `(start_at, id)` ascending
    pub items: Vec<Lesson>,
    /// Total number of lessons matching the listing, from `COUNT(*) OVER()`
    pub total: i64,
    /// Cursor for the next page; `None` when this page is the last
    pub next_cursor: Option<LessonCursor>,
}

impl LessonPage {
    /// Check if the page is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of lessons in the page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
