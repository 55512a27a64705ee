//! Course repository
//!
//! Database operations for courses, including the dynamically filtered
//! `retrieve` listing. `retrieve` assembles its WHERE clause from the set
//! fields of a `CourseFilter` and reports the total match count through a
//! `COUNT(*) OVER()` window alongside the page, so the count and the page
//! always come from the same snapshot.

use crate::db::entity::{self, BindValue, Table};
use crate::models::{
    Course, CourseFilter, CourseStatus, CreateCourseInput, ListParams, PagedResult,
    UpdateCourseInput,
};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

impl Table for Course {
    const TABLE: &'static str = "courses";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "subject",
        "grade_level",
        "status",
        "display_order",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "name",
        "subject",
        "grade_level",
        "status",
        "display_order",
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
            self.name.clone().into(),
            self.subject.clone().into(),
            self.grade_level.into(),
            self.status.as_str().into(),
            self.display_order.into(),
            self.created_at.into(),
            self.updated_at.into(),
            self.deleted_at.into(),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let status_str: String = row.get("status");
        let status = CourseStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid course status: {}", status_str))?;

        Ok(Self {
            id: row.get("id"),
            name: row.get("name"),
            subject: row.get("subject"),
            grade_level: row.get("grade_level"),
            status,
            display_order: row.get("display_order"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        })
    }
}

/// Columns refreshed when an id-keyed upsert hits an existing course.
/// Deliberately a subset: created_at and deleted_at are never touched by
/// catalog syncs.
const UPSERT_UPDATE: &[&str] = &[
    "name",
    "subject",
    "grade_level",
    "status",
    "display_order",
    "updated_at",
];

/// Course repository trait
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Create a new course
    async fn create(&self, input: &CreateCourseInput) -> Result<Course>;

    /// Get course by ID (soft-deleted courses are still fetchable by ID)
    async fn get_by_id(&self, id: i64) -> Result<Option<Course>>;

    /// Update a course; errors unless exactly one row is affected
    async fn update(&self, id: i64, input: &UpdateCourseInput) -> Result<Course>;

    /// Insert or, when the id already exists, refresh the catalog subset
    async fn upsert(&self, course: &Course) -> Result<()>;

    /// Soft delete a course; errors unless exactly one live row is affected
    async fn soft_delete(&self, id: i64) -> Result<()>;

    /// Dynamically filtered, offset-paginated listing with a window total
    async fn retrieve(
        &self,
        filter: &CourseFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Course>>;
}

/// SQLx-based course repository implementation
pub struct SqlxCourseRepository {
    pool: SqlitePool,
}

impl SqlxCourseRepository {
    /// Create a new SQLx course repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CourseRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Assemble WHERE conditions and their binds from the set filter fields
fn build_predicates(filter: &CourseFilter) -> (Vec<String>, Vec<BindValue>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(ids) = &filter.ids {
        if ids.is_empty() {
            // An empty id set matches nothing
            conditions.push("1 = 0".to_string());
        } else {
            conditions.push(format!("id IN ({})", entity::placeholders(ids.len())));
            binds.extend(ids.iter().map(|id| BindValue::from(*id)));
        }
    }

    if let Some(keyword) = &filter.keyword {
        conditions.push("name LIKE ?".to_string());
        binds.push(format!("%{}%", keyword).into());
    }

    if let Some(subject) = &filter.subject {
        conditions.push("subject = ?".to_string());
        binds.push(subject.clone().into());
    }

    if let Some(grade_level) = filter.grade_level {
        conditions.push("grade_level = ?".to_string());
        binds.push(grade_level.into());
    }

    if let Some(statuses) = &filter.statuses {
        if statuses.is_empty() {
            conditions.push("1 = 0".to_string());
        } else {
            conditions.push(format!(
                "status IN ({})",
                entity::placeholders(statuses.len())
            ));
            binds.extend(statuses.iter().map(|s| BindValue::from(s.as_str())));
        }
    }

    if !filter.include_deleted {
        conditions.push("deleted_at IS NULL".to_string());
    }

    (conditions, binds)
}

#[async_trait]
impl CourseRepository for SqlxCourseRepository {
    async fn create(&self, input: &CreateCourseInput) -> Result<Course> {
        let now = Utc::now();
        let course = Course {
            id: 0,
            name: input.name.clone(),
            subject: input.subject.clone(),
            grade_level: input.grade_level,
            status: input.status.unwrap_or_default(),
            display_order: input.display_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = entity::insert(&self.pool, &course)
            .await
            .context("Failed to create course")?;

        Ok(Course { id, ..course })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Course>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            entity::column_list::<Course>(),
            Course::TABLE
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get course by ID")?;

        match row {
            Some(row) => Ok(Some(Course::from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: i64, input: &UpdateCourseInput) -> Result<Course> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Course not found"))?;

        let now = Utc::now();
        let new_name = input.name.as_ref().unwrap_or(&existing.name);
        let new_subject = input.subject.as_ref().unwrap_or(&existing.subject);
        let new_grade_level = input.grade_level.unwrap_or(existing.grade_level);
        let new_status = input.status.unwrap_or(existing.status);
        let new_display_order = input.display_order.unwrap_or(existing.display_order);

        let result = sqlx::query(
            "UPDATE courses SET name = ?, subject = ?, grade_level = ?, status = ?, \
             display_order = ?, updated_at = ? WHERE id = ?",
        )
        .bind(new_name)
        .bind(new_subject)
        .bind(new_grade_level)
        .bind(new_status.as_str())
        .bind(new_display_order)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update course")?;

        if result.rows_affected() != 1 {
            bail!(
                "Course update affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        Ok(Course {
            name: new_name.clone(),
            subject: new_subject.clone(),
            grade_level: new_grade_level,
            status: new_status,
            display_order: new_display_order,
            updated_at: now,
            ..existing
        })
    }

    async fn upsert(&self, course: &Course) -> Result<()> {
        entity::upsert_by_id(&self.pool, course, UPSERT_UPDATE)
            .await
            .context("Failed to upsert course")?;
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> Result<()> {
        let result =
            sqlx::query("UPDATE courses SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .context("Failed to soft delete course")?;

        if result.rows_affected() != 1 {
            bail!(
                "Course soft delete affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        Ok(())
    }

    async fn retrieve(
        &self,
        filter: &CourseFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Course>> {
        let (conditions, mut binds) = build_predicates(filter);
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {}, COUNT(*) OVER() AS total FROM {}{} \
             ORDER BY display_order ASC, created_at DESC, id DESC LIMIT ? OFFSET ?",
            entity::column_list::<Course>(),
            Course::TABLE,
            where_clause
        );
        binds.push(params.limit().into());
        binds.push(params.offset().into());

        let rows = entity::bind_all(sqlx::query(&sql), binds)
            .fetch_all(&self.pool)
            .await
            .context("Failed to retrieve courses")?;

        // The window total is absent when the page is empty (offset past the
        // end or nothing matched); report zero rather than a second query.
        let total = rows
            .first()
            .map(|row| row.get::<i64, _>("total"))
            .unwrap_or(0);

        let mut courses = Vec::new();
        for row in rows {
            courses.push(Course::from_row(&row)?);
        }

        Ok(PagedResult::new(courses, total, params))
    }
}
