//! Lesson repository
//!
//! Database operations for lessons, including the cursor-paginated
//! schedule listing. Pages are keyed on the `(start_at, id)` value pair
//! rather than a row position, so a page boundary stays valid even when
//! the lesson it pointed at has since been soft deleted.

use crate::db::entity::{self, BindValue, Table};
use crate::models::{
    CreateLessonInput, Lesson, LessonCursor, LessonPage, SchedulingStatus, UpdateLessonInput,
};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

impl Table for Lesson {
    const TABLE: &'static str = "lessons";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "course_id",
        "teacher_id",
        "name",
        "start_at",
        "end_at",
        "scheduling_status",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "course_id",
        "teacher_id",
        "name",
        "start_at",
        "end_at",
        "scheduling_status",
        "created_at",
        "updated_at",
        "deleted_at",
    ];

    fn bind_values(&self) -> Vec<BindValue> {
        let mut values = vec![BindValue::from(self.id)];
        values.extend(self.insert_values());
        values
    }

    fn insert_values(&self) -> Vec<BindValue> {
        vec![
            self.course_id.into(),
            self.teacher_id.into(),
            self.name.clone().into(),
            self.start_at.into(),
            self.end_at.into(),
            self.scheduling_status.as_str().into(),
            self.created_at.into(),
            self.updated_at.into(),
            self.deleted_at.into(),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let status_str: String = row.get("scheduling_status");
        let scheduling_status = SchedulingStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid scheduling status: {}", status_str))?;

        Ok(Self {
            id: row.get("id"),
            course_id: row.get("course_id"),
            teacher_id: row.get("teacher_id"),
            name: row.get("name"),
            start_at: row.get("start_at"),
            end_at: row.get("end_at"),
            scheduling_status,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        })
    }
}

/// Columns refreshed when an id-keyed upsert hits an existing lesson.
/// `created_at` and `deleted_at` stay as stored.
const UPSERT_UPDATE: &[&str] = &[
    "teacher_id",
    "name",
    "start_at",
    "end_at",
    "scheduling_status",
    "updated_at",
];

/// Lesson repository trait
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Create a new lesson
    async fn create(&self, input: &CreateLessonInput) -> Result<Lesson>;

    /// Get lesson by ID, including soft-deleted ones
    async fn get_by_id(&self, id: i64) -> Result<Option<Lesson>>;

    /// Update a lesson; errors unless exactly one row is affected
    async fn update(&self, id: i64, input: &UpdateLessonInput) -> Result<Lesson>;

    /// Insert or, when the id already exists, refresh the schedule subset
    async fn upsert(&self, lesson: &Lesson) -> Result<()>;

    /// Soft delete a lesson; errors if already deleted or missing
    async fn soft_delete(&self, id: i64) -> Result<()>;

    /// One page of a course's schedule, ordered by `(start_at, id)`
    /// ascending. Rows at or before the cursor are excluded, so `total`
    /// counts what remains from the cursor onward. `next_cursor` is set
    /// whenever the page came back full.
    async fn retrieve(
        &self,
        course_id: i64,
        cursor: Option<&LessonCursor>,
        limit: i64,
    ) -> Result<LessonPage>;

    /// The cursor that fetches the page before the one starting after
    /// `anchor`. `None` means the previous page is the first page and
    /// should be fetched without a cursor.
    async fn find_previous_page_cursor(
        &self,
        course_id: i64,
        anchor: &LessonCursor,
        limit: i64,
    ) -> Result<Option<LessonCursor>>;
}

/// SQLx-based lesson repository implementation
pub struct SqlxLessonRepository {
    pool: SqlitePool,
}

impl SqlxLessonRepository {
    /// Create a new SQLx lesson repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn LessonRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LessonRepository for SqlxLessonRepository {
    async fn create(&self, input: &CreateLessonInput) -> Result<Lesson> {
        let now = Utc::now();
        let lesson = Lesson {
            id: 0,
            course_id: input.course_id,
            teacher_id: input.teacher_id,
            name: input.name.clone(),
            start_at: input.start_at,
            end_at: input.end_at,
            scheduling_status: SchedulingStatus::Scheduled,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = entity::insert(&self.pool, &lesson)
            .await
            .context("Failed to create lesson")?;

        Ok(Lesson { id, ..lesson })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Lesson>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            entity::column_list::<Lesson>(),
            Lesson::TABLE
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get lesson by ID")?;

        match row {
            Some(row) => Ok(Some(Lesson::from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: i64, input: &UpdateLessonInput) -> Result<Lesson> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Lesson not found"))?;
        if existing.is_deleted() {
            bail!("Lesson has been deleted");
        }

        let now = Utc::now();
        let new_name = input.name.as_ref().unwrap_or(&existing.name);
        let new_start_at = input.start_at.unwrap_or(existing.start_at);
        let new_end_at = input.end_at.or(existing.end_at);
        let new_teacher_id = input.teacher_id.or(existing.teacher_id);
        let new_status = input.scheduling_status.unwrap_or(existing.scheduling_status);

        let result = sqlx::query(
            "UPDATE lessons SET name = ?, start_at = ?, end_at = ?, teacher_id = ?, \
             scheduling_status = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(new_name)
        .bind(new_start_at)
        .bind(new_end_at)
        .bind(new_teacher_id)
        .bind(new_status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update lesson")?;

        if result.rows_affected() != 1 {
            bail!(
                "Lesson update affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        Ok(Lesson {
            name: new_name.clone(),
            start_at: new_start_at,
            end_at: new_end_at,
            teacher_id: new_teacher_id,
            scheduling_status: new_status,
            updated_at: now,
            ..existing
        })
    }

    async fn upsert(&self, lesson: &Lesson) -> Result<()> {
        entity::upsert_by_id(&self.pool, lesson, UPSERT_UPDATE)
            .await
            .context("Failed to upsert lesson")?;
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> Result<()> {
        let result =
            sqlx::query("UPDATE lessons SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .context("Failed to delete lesson")?;

        if result.rows_affected() != 1 {
            bail!(
                "Lesson delete affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        Ok(())
    }

    async fn retrieve(
        &self,
        course_id: i64,
        cursor: Option<&LessonCursor>,
        limit: i64,
    ) -> Result<LessonPage> {
        let mut conditions = vec![
            "course_id = ?".to_string(),
            "deleted_at IS NULL".to_string(),
        ];
        let mut binds: Vec<BindValue> = vec![course_id.into()];

        if let Some(cursor) = cursor {
            // Strict inequality on the value pair: the anchor row itself is
            // excluded, whether or not it still exists.
            conditions.push("(start_at > ? OR (start_at = ? AND id > ?))".to_string());
            binds.push(cursor.start_at.into());
            binds.push(cursor.start_at.into());
            binds.push(cursor.id.into());
        }

        let sql = format!(
            "SELECT {}, COUNT(*) OVER() AS total FROM {} WHERE {} \
             ORDER BY start_at ASC, id ASC LIMIT ?",
            entity::column_list::<Lesson>(),
            Lesson::TABLE,
            conditions.join(" AND ")
        );
        binds.push(limit.into());

        let rows = entity::bind_all(sqlx::query(&sql), binds)
            .fetch_all(&self.pool)
            .await
            .context("Failed to retrieve lessons")?;

        // The window counts every row matching the WHERE clause, before
        // LIMIT; an empty page means nothing remains.
        let total = rows
            .first()
            .map(|row| row.get::<i64, _>("total"))
            .unwrap_or(0);

        let mut items = Vec::new();
        for row in &rows {
            items.push(Lesson::from_row(row)?);
        }

        let next_cursor = if items.len() as i64 == limit && limit > 0 {
            items.last().map(Lesson::cursor)
        } else {
            None
        };

        Ok(LessonPage {
            items,
            total,
            next_cursor,
        })
    }

    async fn find_previous_page_cursor(
        &self,
        course_id: i64,
        anchor: &LessonCursor,
        limit: i64,
    ) -> Result<Option<LessonCursor>> {
        // Walk backwards from the anchor, anchor row included since it is
        // the last row of the previous page. The row `limit` positions back
        // is that page's exclusive boundary; if the walk runs out of rows
        // first, the previous page is the unanchored first page.
        let sql = format!(
            "SELECT {} FROM {} WHERE course_id = ? AND deleted_at IS NULL \
             AND (start_at < ? OR (start_at = ? AND id <= ?)) \
             ORDER BY start_at DESC, id DESC LIMIT 1 OFFSET ?",
            entity::column_list::<Lesson>(),
            Lesson::TABLE
        );
        let row = sqlx::query(&sql)
            .bind(course_id)
            .bind(anchor.start_at)
            .bind(anchor.start_at)
            .bind(anchor.id)
            .bind(limit)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find previous page cursor")?;

        match row {
            Some(row) => Ok(Some(Lesson::from_row(&row)?.cursor())),
            None => Ok(None),
        }
    }
}
