//! Quiz repository
//!
//! Database operations for quizzes synced from the external content tool.
//! The content tool's UUID is the upsert key; the question body is stored
//! as its JSON text.

use crate::db::entity::{self, placeholders, BindValue, Table};
use crate::models::{Quiz, QuizKind};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

impl Table for Quiz {
    const TABLE: &'static str = "quizzes";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "external_id",
        "lesson_id",
        "kind",
        "question",
        "point",
        "display_order",
        "created_at",
        "updated_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "external_id",
        "lesson_id",
        "kind",
        "question",
        "point",
        "display_order",
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
            self.external_id.into(),
            self.lesson_id.into(),
            self.kind.as_str().into(),
            self.question.to_string().into(),
            self.point.into(),
            self.display_order.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let external_id: String = row.get("external_id");
        let external_id = Uuid::parse_str(&external_id)
            .with_context(|| format!("Invalid quiz external ID: {}", external_id))?;

        let kind_str: String = row.get("kind");
        let kind = QuizKind::from_str(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid quiz kind: {}", kind_str))?;

        let question: String = row.get("question");
        let question =
            serde_json::from_str(&question).context("Invalid quiz question document")?;

        Ok(Self {
            id: row.get("id"),
            external_id,
            lesson_id: row.get("lesson_id"),
            kind,
            question,
            point: row.get("point"),
            display_order: row.get("display_order"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Columns refreshed when a sync hits an existing external ID
const UPSERT_UPDATE: &[&str] = &[
    "lesson_id",
    "kind",
    "question",
    "point",
    "display_order",
    "updated_at",
];

/// Quiz repository trait
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Insert or, when the external ID already exists, refresh the synced
    /// subset
    async fn upsert(&self, quiz: &Quiz) -> Result<()>;

    /// Get quizzes by external ID list; result order is not guaranteed to
    /// match the input, and an empty input yields an empty result
    async fn get_by_external_ids(&self, external_ids: &[Uuid]) -> Result<Vec<Quiz>>;

    /// Quizzes of a lesson, ordered by `display_order`, then id
    async fn list_by_lesson(&self, lesson_id: i64) -> Result<Vec<Quiz>>;

    /// Delete by external ID; errors unless exactly one row is affected
    async fn delete_by_external_id(&self, external_id: Uuid) -> Result<()>;
}

/// SQLx-based quiz repository implementation
pub struct SqlxQuizRepository {
    pool: SqlitePool,
}

impl SqlxQuizRepository {
    /// Create a new SQLx quiz repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn QuizRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl QuizRepository for SqlxQuizRepository {
    async fn upsert(&self, quiz: &Quiz) -> Result<()> {
        entity::upsert(&self.pool, quiz, &["external_id"], UPSERT_UPDATE)
            .await
            .context("Failed to upsert quiz")?;
        Ok(())
    }

    async fn get_by_external_ids(&self, external_ids: &[Uuid]) -> Result<Vec<Quiz>> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE external_id IN ({})",
            entity::column_list::<Quiz>(),
            Quiz::TABLE,
            placeholders(external_ids.len())
        );
        let binds = external_ids.iter().map(|id| BindValue::from(*id)).collect();

        // Sync batches can run to thousands of ids, so decode row by row
        // instead of buffering the whole result set.
        let mut stream = entity::bind_all(sqlx::query(&sql), binds).fetch(&self.pool);
        let mut quizzes = Vec::new();
        while let Some(row) = stream
            .try_next()
            .await
            .context("Failed to get quizzes by external IDs")?
        {
            quizzes.push(Quiz::from_row(&row)?);
        }

        Ok(quizzes)
    }

    async fn list_by_lesson(&self, lesson_id: i64) -> Result<Vec<Quiz>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE lesson_id = ? ORDER BY display_order ASC, id ASC",
            entity::column_list::<Quiz>(),
            Quiz::TABLE
        );
        let rows = sqlx::query(&sql)
            .bind(lesson_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list quizzes by lesson")?;

        let mut quizzes = Vec::new();
        for row in rows {
            quizzes.push(Quiz::from_row(&row)?);
        }

        Ok(quizzes)
    }

    async fn delete_by_external_id(&self, external_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM quizzes WHERE external_id = ?")
            .bind(external_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete quiz")?;

        if result.rows_affected() != 1 {
            bail!(
                "Quiz delete affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::course::{CourseRepository, SqlxCourseRepository};
    use crate::db::repositories::lesson::{LessonRepository, SqlxLessonRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateCourseInput, CreateLessonInput};
    use serde_json::json;

    async fn setup_test_repo() -> (SqlitePool, SqlxQuizRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let courses = SqlxCourseRepository::new(pool.clone());
        let course = courses
            .create(&CreateCourseInput::new(
                "Algebra I".to_string(),
                "math".to_string(),
                7,
            ))
            .await
            .expect("Failed to create course");

        let lessons = SqlxLessonRepository::new(pool.clone());
        let lesson = lessons
            .create(&CreateLessonInput::new(
                course.id,
                "Intro".to_string(),
                Utc::now(),
            ))
            .await
            .expect("Failed to create lesson");

        let repo = SqlxQuizRepository::new(pool.clone());
        (pool, repo, lesson.id)
    }

    fn sample_question(stem: &str) -> serde_json::Value {
        json!({ "stem": stem, "choices": ["a", "b", "c"], "answer": 1 })
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_refreshes() {
        let (_pool, repo, lesson_id) = setup_test_repo().await;

        let external_id = Uuid::new_v4();
        let quiz = Quiz::new(
            external_id,
            lesson_id,
            QuizKind::MultipleChoice,
            sample_question("2 + 2 = ?"),
        )
        .with_point(2);
        repo.upsert(&quiz).await.expect("Failed to upsert");

        let stored = repo
            .get_by_external_ids(&[external_id])
            .await
            .expect("Failed to get quizzes");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].point, 2);
        assert_eq!(stored[0].question["stem"], "2 + 2 = ?");

        // Same external id with revised content updates in place
        let revised = Quiz::new(
            external_id,
            lesson_id,
            QuizKind::Essay,
            sample_question("Explain your answer"),
        )
        .with_point(5);
        repo.upsert(&revised).await.expect("Failed to upsert");

        let stored = repo
            .get_by_external_ids(&[external_id])
            .await
            .expect("Failed to get quizzes");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, QuizKind::Essay);
        assert_eq!(stored[0].point, 5);
    }

    #[tokio::test]
    async fn test_get_by_external_ids() {
        let (_pool, repo, lesson_id) = setup_test_repo().await;

        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            repo.upsert(&Quiz::new(
                *id,
                lesson_id,
                QuizKind::MultipleChoice,
                sample_question("q"),
            ))
            .await
            .expect("Failed to upsert");
        }

        // Unknown ids are simply absent from the result
        let found = repo
            .get_by_external_ids(&[ids[0], Uuid::new_v4(), ids[2]])
            .await
            .expect("Failed to get quizzes");
        assert_eq!(found.len(), 2);
        let found_ids: Vec<Uuid> = found.iter().map(|q| q.external_id).collect();
        assert!(found_ids.contains(&ids[0]));
        assert!(found_ids.contains(&ids[2]));

        let none = repo
            .get_by_external_ids(&[])
            .await
            .expect("Failed to get quizzes");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_list_by_lesson_ordering() {
        let (_pool, repo, lesson_id) = setup_test_repo().await;

        for (stem, order) in [("third", 3), ("first", 1), ("second", 2)] {
            repo.upsert(
                &Quiz::new(
                    Uuid::new_v4(),
                    lesson_id,
                    QuizKind::MultipleChoice,
                    sample_question(stem),
                )
                .with_display_order(order),
            )
            .await
            .expect("Failed to upsert");
        }

        let quizzes = repo
            .list_by_lesson(lesson_id)
            .await
            .expect("Failed to list quizzes");
        assert_eq!(
            quizzes
                .iter()
                .map(|q| q.question["stem"].as_str().unwrap())
                .collect::<Vec<_>>(),
            vec!["first", "second", "third"]
        );

        assert!(repo
            .list_by_lesson(99999)
            .await
            .expect("Failed to list quizzes")
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_external_id() {
        let (_pool, repo, lesson_id) = setup_test_repo().await;

        let external_id = Uuid::new_v4();
        repo.upsert(&Quiz::new(
            external_id,
            lesson_id,
            QuizKind::MultipleChoice,
            sample_question("q"),
        ))
        .await
        .expect("Failed to upsert");

        repo.delete_by_external_id(external_id)
            .await
            .expect("Failed to delete");
        assert!(repo
            .get_by_external_ids(&[external_id])
            .await
            .expect("Failed to get quizzes")
            .is_empty());

        // Second delete affects zero rows and must error
        assert!(repo.delete_by_external_id(external_id).await.is_err());
    }
}
