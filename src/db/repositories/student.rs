//! Student repository
//!
//! Database operations for student profiles, including the batch upsert
//! used by roster imports (keyed on enrollment number).

use crate::db::batch::{Batch, BatchOutcome};
use crate::db::entity::{self, upsert_sql, BindValue, Table};
use crate::models::{CreateStudentInput, Student};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

impl Table for Student {
    const TABLE: &'static str = "students";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "enrollment_number",
        "grade_level",
        "created_at",
        "updated_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "user_id",
        "enrollment_number",
        "grade_level",
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
            self.user_id.into(),
            self.enrollment_number.clone().into(),
            self.grade_level.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            enrollment_number: row.get("enrollment_number"),
            grade_level: row.get("grade_level"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Columns refreshed when a roster import hits an existing enrollment number
const UPSERT_UPDATE: &[&str] = &["user_id", "grade_level", "updated_at"];

/// Student repository trait
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Create a new student
    async fn create(&self, input: &CreateStudentInput) -> Result<Student>;

    /// Get student by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Student>>;

    /// Get student by backing user account
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<Student>>;

    /// Get student by enrollment number
    async fn get_by_enrollment_number(&self, number: &str) -> Result<Option<Student>>;

    /// List members of a class, ordered by enrollment number
    async fn list_by_class(&self, class_id: i64) -> Result<Vec<Student>>;

    /// Count members of a class
    async fn count_by_class(&self, class_id: i64) -> Result<i64>;

    /// Update a student's grade level; errors unless exactly one row is affected
    async fn update_grade_level(&self, id: i64, grade_level: i32) -> Result<Student>;

    /// Batch upsert keyed on enrollment number. Best effort per item: the
    /// outcome holds one result per student in input order, and a failed
    /// item does not undo earlier ones.
    async fn upsert_batch(&self, students: &[Student]) -> Result<BatchOutcome>;
}

/// SQLx-based student repository implementation
pub struct SqlxStudentRepository {
    pool: SqlitePool,
}

impl SqlxStudentRepository {
    /// Create a new SQLx student repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn StudentRepository> {
        Arc::new(Self::new(pool))
    }

    async fn get_where(&self, predicate: &str, bind: BindValue) -> Result<Option<Student>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            entity::column_list::<Student>(),
            Student::TABLE,
            predicate
        );
        let row = entity::bind_all(sqlx::query(&sql), vec![bind])
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to get student by {}", predicate))?;

        match row {
            Some(row) => Ok(Some(Student::from_row(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StudentRepository for SqlxStudentRepository {
    async fn create(&self, input: &CreateStudentInput) -> Result<Student> {
        let now = Utc::now();
        let student = Student {
            id: 0,
            user_id: input.user_id,
            enrollment_number: input.enrollment_number.clone(),
            grade_level: input.grade_level,
            created_at: now,
            updated_at: now,
        };

        let id = entity::insert(&self.pool, &student)
            .await
            .context("Failed to create student")?;

        Ok(Student { id, ..student })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Student>> {
        self.get_where("id = ?", id.into()).await
    }

    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<Student>> {
        self.get_where("user_id = ?", user_id.into()).await
    }

    async fn get_by_enrollment_number(&self, number: &str) -> Result<Option<Student>> {
        self.get_where("enrollment_number = ?", number.into()).await
    }

    async fn list_by_class(&self, class_id: i64) -> Result<Vec<Student>> {
        let columns = Student::COLUMNS
            .iter()
            .map(|col| format!("s.{}", col))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM students s \
             INNER JOIN class_members cm ON s.id = cm.student_id \
             WHERE cm.class_id = ? \
             ORDER BY s.enrollment_number ASC",
            columns
        );
        let rows = sqlx::query(&sql)
            .bind(class_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list students by class")?;

        let mut students = Vec::new();
        for row in rows {
            students.push(Student::from_row(&row)?);
        }

        Ok(students)
    }

    async fn count_by_class(&self, class_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM class_members WHERE class_id = ?")
            .bind(class_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count students by class")?;

        Ok(row.get("count"))
    }

    async fn update_grade_level(&self, id: i64, grade_level: i32) -> Result<Student> {
        let now = Utc::now();
        let result =
            sqlx::query("UPDATE students SET grade_level = ?, updated_at = ? WHERE id = ?")
                .bind(grade_level)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .context("Failed to update student")?;

        if result.rows_affected() != 1 {
            bail!(
                "Student update affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Student not found after update"))
    }

    async fn upsert_batch(&self, students: &[Student]) -> Result<BatchOutcome> {
        let sql = upsert_sql::<Student>(&["enrollment_number"], UPSERT_UPDATE)?;

        let mut batch = Batch::new();
        for student in students {
            batch.queue(sql.clone(), student.insert_values());
        }
        batch.send(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateUserInput;

    async fn setup_test_repo() -> (SqlitePool, SqlxStudentRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxStudentRepository::new(pool.clone());
        (pool, repo)
    }

    async fn create_test_user(pool: &SqlitePool, name: &str) -> i64 {
        let users = SqlxUserRepository::new(pool.clone());
        users
            .create(&CreateUserInput::new(
                name.to_string(),
                format!("{}@example.com", name),
            ))
            .await
            .expect("Failed to create test user")
            .id
    }

    fn new_student(user_id: i64, number: &str, grade: i32) -> Student {
        let now = Utc::now();
        Student {
            id: 0,
            user_id,
            enrollment_number: number.to_string(),
            grade_level: grade,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_student() {
        let (pool, repo) = setup_test_repo().await;
        let user_id = create_test_user(&pool, "stu1").await;

        let created = repo
            .create(&CreateStudentInput::new(user_id, "EN-001".to_string(), 7))
            .await
            .expect("Failed to create student");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get student")
            .expect("Student not found");
        assert_eq!(found.user_id, user_id);
        assert_eq!(found.enrollment_number, "EN-001");
        assert_eq!(found.grade_level, 7);

        let by_user = repo
            .get_by_user_id(user_id)
            .await
            .expect("Failed to get student")
            .expect("Student not found");
        assert_eq!(by_user.id, created.id);

        let by_number = repo
            .get_by_enrollment_number("EN-001")
            .await
            .expect("Failed to get student")
            .expect("Student not found");
        assert_eq!(by_number.id, created.id);
    }

    #[tokio::test]
    async fn test_update_grade_level() {
        let (pool, repo) = setup_test_repo().await;
        let user_id = create_test_user(&pool, "stu2").await;

        let created = repo
            .create(&CreateStudentInput::new(user_id, "EN-002".to_string(), 7))
            .await
            .expect("Failed to create student");

        let updated = repo
            .update_grade_level(created.id, 8)
            .await
            .expect("Failed to update");
        assert_eq!(updated.grade_level, 8);

        assert!(repo.update_grade_level(99999, 8).await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_batch_inserts_and_updates() {
        let (pool, repo) = setup_test_repo().await;
        let user1 = create_test_user(&pool, "stu3").await;
        let user2 = create_test_user(&pool, "stu4").await;

        repo.create(&CreateStudentInput::new(user1, "EN-100".to_string(), 7))
            .await
            .expect("Failed to create student");

        // One conflict (EN-100, grade bumped) and one fresh insert
        let batch = vec![
            new_student(user1, "EN-100", 8),
            new_student(user2, "EN-101", 7),
        ];
        let outcome = repo.upsert_batch(&batch).await.expect("Failed to upsert");
        assert_eq!(outcome.len(), 2);
        assert!(outcome.iter().all(|r| r.is_ok()));

        let updated = repo
            .get_by_enrollment_number("EN-100")
            .await
            .expect("Failed to get student")
            .expect("Student not found");
        assert_eq!(updated.grade_level, 8);

        let inserted = repo
            .get_by_enrollment_number("EN-101")
            .await
            .expect("Failed to get student");
        assert!(inserted.is_some());
    }

    #[tokio::test]
    async fn test_upsert_batch_partial_failure_keeps_earlier_effects() {
        let (pool, repo) = setup_test_repo().await;
        let user_id = create_test_user(&pool, "stu5").await;

        // Second item violates the users foreign key; first and third are fine
        let batch = vec![
            new_student(user_id, "EN-200", 7),
            new_student(99999, "EN-201", 7),
            new_student(user_id, "EN-202", 7),
        ];
        let outcome = repo.upsert_batch(&batch).await.expect("Failed to send");
        assert_eq!(outcome.len(), 3);
        assert!(outcome[0].is_ok());
        assert!(outcome[1].is_err());
        assert!(outcome[2].is_ok());

        assert!(repo
            .get_by_enrollment_number("EN-200")
            .await
            .expect("Failed to get")
            .is_some());
        assert!(repo
            .get_by_enrollment_number("EN-201")
            .await
            .expect("Failed to get")
            .is_none());
        assert!(repo
            .get_by_enrollment_number("EN-202")
            .await
            .expect("Failed to get")
            .is_some());
    }
}
