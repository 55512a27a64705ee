//! Quiz model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quiz entity
///
/// Quizzes are authored in an external content tool and synced in, so the
/// external UUID is the natural key used by upserts. The question body is
/// an opaque JSON document owned by the content tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    /// Unique identifier
    pub id: i64,
    /// Identifier assigned by the content tool (unique)
    pub external_id: Uuid,
    /// Lesson this quiz belongs to
    pub lesson_id: i64,
    /// Question kind
    pub kind: QuizKind,
    /// Question body (JSON document)
    pub question: serde_json::Value,
    /// Points awarded for a correct answer
    pub point: i32,
    /// Position within the lesson (lower = earlier)
    #[serde(default)]
    pub display_order: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    /// Create a new quiz; the id is assigned by the database
    pub fn new(external_id: Uuid, lesson_id: i64, kind: QuizKind, question: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            external_id,
            lesson_id,
            kind,
            question,
            point: 1,
            display_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the points awarded
    pub fn with_point(mut self, point: i32) -> Self {
        self.point = point;
        self
    }

    /// Set the position within the lesson
    pub fn with_display_order(mut self, display_order: i32) -> Self {
        self.display_order = display_order;
        self
    }
}

/// Quiz question kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    /// Pick one of several options (default)
    #[default]
    MultipleChoice,
    /// Fill in the blank
    FillInBlank,
    /// Free-form written answer
    Essay,
}

impl QuizKind {
    /// Convert kind to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizKind::MultipleChoice => "multiple_choice",
            QuizKind::FillInBlank => "fill_in_blank",
            QuizKind::Essay => "essay",
        }
    }

    /// Parse kind from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "multiple_choice" => Some(QuizKind::MultipleChoice),
            "fill_in_blank" => Some(QuizKind::FillInBlank),
            "essay" => Some(QuizKind::Essay),
            _ => None,
        }
    }
}
