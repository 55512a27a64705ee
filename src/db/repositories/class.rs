//! Class repository
//!
//! Database operations for classes and their membership join table.

use crate::db::entity::{self, BindValue, Table};
use crate::models::{Class, ClassStatus, CreateClassInput, UpdateClassInput};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

impl Table for Class {
    const TABLE: &'static str = "classes";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "course_id",
        "name",
        "teacher_id",
        "capacity",
        "status",
        "created_at",
        "updated_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "course_id",
        "name",
        "teacher_id",
        "capacity",
        "status",
        "created_at",
        "updated_at",
    ];

    fn bind_values(&self) -> Vec<BindValue> {
        let mut values = vec![BindValue::from(self.id)];
        values.extend(self.insert_values());
        values
    }

    fn insert_values(&self) -> Vec<BindValue> {
        vec![
            self.course_id.into(),
            self.name.clone().into(),
            self.teacher_id.into(),
            self.capacity.into(),
            self.status.as_str().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let status_str: String = row.get("status");
        let status = ClassStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid class status: {}", status_str))?;

        Ok(Self {
            id: row.get("id"),
            course_id: row.get("course_id"),
            name: row.get("name"),
            teacher_id: row.get("teacher_id"),
            capacity: row.get("capacity"),
            status,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Columns refreshed when an id-keyed upsert hits an existing class
const UPSERT_UPDATE: &[&str] = &["name", "teacher_id", "capacity", "status", "updated_at"];

/// Class repository trait
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Create a new class
    async fn create(&self, input: &CreateClassInput) -> Result<Class>;

    /// Get class by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Class>>;

    /// List classes of a course, oldest first
    async fn list_by_course(&self, course_id: i64) -> Result<Vec<Class>>;

    /// Update a class; errors unless exactly one row is affected
    async fn update(&self, id: i64, input: &UpdateClassInput) -> Result<Class>;

    /// Insert or, when the id already exists, refresh the roster subset
    async fn upsert(&self, class: &Class) -> Result<()>;

    /// Add a student to the class; adding an existing member is a no-op
    async fn add_member(&self, class_id: i64, student_id: i64) -> Result<()>;

    /// Remove a student from the class; errors unless exactly one row is affected
    async fn remove_member(&self, class_id: i64, student_id: i64) -> Result<()>;

    /// Member student IDs, in enrollment order
    async fn member_ids(&self, class_id: i64) -> Result<Vec<i64>>;
}

/// SQLx-based class repository implementation
pub struct SqlxClassRepository {
    pool: SqlitePool,
}

impl SqlxClassRepository {
    /// Create a new SQLx class repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ClassRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ClassRepository for SqlxClassRepository {
    async fn create(&self, input: &CreateClassInput) -> Result<Class> {
        let now = Utc::now();
        let class = Class {
            id: 0,
            course_id: input.course_id,
            name: input.name.clone(),
            teacher_id: input.teacher_id,
            capacity: input.capacity.unwrap_or(0),
            status: ClassStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let id = entity::insert(&self.pool, &class)
            .await
            .context("Failed to create class")?;

        Ok(Class { id, ..class })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Class>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            entity::column_list::<Class>(),
            Class::TABLE
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get class by ID")?;

        match row {
            Some(row) => Ok(Some(Class::from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_course(&self, course_id: i64) -> Result<Vec<Class>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE course_id = ? ORDER BY created_at ASC, id ASC",
            entity::column_list::<Class>(),
            Class::TABLE
        );
        let rows = sqlx::query(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list classes by course")?;

        let mut classes = Vec::new();
        for row in rows {
            classes.push(Class::from_row(&row)?);
        }

        Ok(classes)
    }

    async fn update(&self, id: i64, input: &UpdateClassInput) -> Result<Class> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Class not found"))?;

        let now = Utc::now();
        let new_name = input.name.as_ref().unwrap_or(&existing.name);
        let new_teacher_id = input.teacher_id.or(existing.teacher_id);
        let new_capacity = input.capacity.unwrap_or(existing.capacity);
        let new_status = input.status.unwrap_or(existing.status);

        let result = sqlx::query(
            "UPDATE classes SET name = ?, teacher_id = ?, capacity = ?, status = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(new_name)
        .bind(new_teacher_id)
        .bind(new_capacity)
        .bind(new_status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update class")?;

        if result.rows_affected() != 1 {
            bail!(
                "Class update affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        Ok(Class {
            name: new_name.clone(),
            teacher_id: new_teacher_id,
            capacity: new_capacity,
            status: new_status,
            updated_at: now,
            ..existing
        })
    }

    async fn upsert(&self, class: &Class) -> Result<()> {
        entity::upsert_by_id(&self.pool, class, UPSERT_UPDATE)
            .await
            .context("Failed to upsert class")?;
        Ok(())
    }

    async fn add_member(&self, class_id: i64, student_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO class_members (class_id, student_id, added_at) VALUES (?, ?, ?) \
             ON CONFLICT(class_id, student_id) DO NOTHING",
        )
        .bind(class_id)
        .bind(student_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to add class member")?;

        Ok(())
    }

    async fn remove_member(&self, class_id: i64, student_id: i64) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM class_members WHERE class_id = ? AND student_id = ?")
                .bind(class_id)
                .bind(student_id)
                .execute(&self.pool)
                .await
                .context("Failed to remove class member")?;

        if result.rows_affected() != 1 {
            bail!(
                "Class member removal affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        Ok(())
    }

    async fn member_ids(&self, class_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            "SELECT student_id FROM class_members WHERE class_id = ? ORDER BY added_at ASC, student_id ASC",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list class member IDs")?;

        Ok(rows.iter().map(|row| row.get("student_id")).collect())
    }
}
