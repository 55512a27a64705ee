//! Book repository
//!
//! Database operations for textbooks and their course attachments
//! (join table `course_books`). Catalog imports arrive as batches
//! keyed on ISBN.

use crate::db::batch::{Batch, BatchOutcome};
use crate::db::entity::{self, placeholders, upsert_sql, BindValue, Table};
use crate::models::Book;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

impl Table for Book {
    const TABLE: &'static str = "books";
    const COLUMNS: &'static [&'static str] =
        &["id", "isbn", "name", "subject", "created_at", "updated_at"];
    const INSERT_COLUMNS: &'static [&'static str] =
        &["isbn", "name", "subject", "created_at", "updated_at"];

    fn bind_values(&self) -> Vec<BindValue> {
        let mut values = vec![BindValue::from(self.id)];
        values.extend(self.insert_values());
        values
    }

    fn insert_values(&self) -> Vec<BindValue> {
        vec![
            self.isbn.clone().into(),
            self.name.clone().into(),
            self.subject.clone().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            isbn: row.get("isbn"),
            name: row.get("name"),
            subject: row.get("subject"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Columns refreshed when a catalog import hits an existing ISBN
const UPSERT_UPDATE: &[&str] = &["name", "subject", "updated_at"];

/// Book repository trait
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Create a new book
    async fn create(&self, book: &Book) -> Result<Book>;

    /// Get book by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Book>>;

    /// Get book by ISBN
    async fn get_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;

    /// Get books by ID list; an empty input yields an empty result
    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Book>>;

    /// Batch upsert keyed on ISBN; best effort per item
    async fn upsert_batch(&self, books: &[Book]) -> Result<BatchOutcome>;

    /// Attach a book to a course; re-attaching is a no-op
    async fn attach_to_course(&self, book_id: i64, course_id: i64) -> Result<()>;

    /// Detach a book from a course
    async fn detach_from_course(&self, book_id: i64, course_id: i64) -> Result<()>;

    /// Books attached to a course, ordered by name
    async fn list_by_course(&self, course_id: i64) -> Result<Vec<Book>>;
}

/// SQLx-based book repository implementation
pub struct SqlxBookRepository {
    pool: SqlitePool,
}

impl SqlxBookRepository {
    /// Create a new SQLx book repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn BookRepository> {
        Arc::new(Self::new(pool))
    }

    async fn get_where(&self, predicate: &str, bind: BindValue) -> Result<Option<Book>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            entity::column_list::<Book>(),
            Book::TABLE,
            predicate
        );
        let row = entity::bind_all(sqlx::query(&sql), vec![bind])
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to get book by {}", predicate))?;

        match row {
            Some(row) => Ok(Some(Book::from_row(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BookRepository for SqlxBookRepository {
    async fn create(&self, book: &Book) -> Result<Book> {
        let now = Utc::now();
        let book = Book {
            created_at: now,
            updated_at: now,
            ..book.clone()
        };

        let id = entity::insert(&self.pool, &book)
            .await
            .context("Failed to create book")?;

        Ok(Book { id, ..book })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>> {
        self.get_where("id = ?", id.into()).await
    }

    async fn get_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        self.get_where("isbn = ?", isbn.into()).await
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Book>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE id IN ({}) ORDER BY id ASC",
            entity::column_list::<Book>(),
            Book::TABLE,
            placeholders(ids.len())
        );
        let binds = ids.iter().map(|id| BindValue::from(*id)).collect();
        let rows = entity::bind_all(sqlx::query(&sql), binds)
            .fetch_all(&self.pool)
            .await
            .context("Failed to get books by IDs")?;

        let mut books = Vec::new();
        for row in rows {
            books.push(Book::from_row(&row)?);
        }

        Ok(books)
    }

    async fn upsert_batch(&self, books: &[Book]) -> Result<BatchOutcome> {
        let sql = upsert_sql::<Book>(&["isbn"], UPSERT_UPDATE)?;

        let mut batch = Batch::new();
        for book in books {
            batch.queue(sql.clone(), book.insert_values());
        }
        batch.send(&self.pool).await
    }

    async fn attach_to_course(&self, book_id: i64, course_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO course_books (course_id, book_id) VALUES (?, ?) \
             ON CONFLICT(course_id, book_id) DO NOTHING",
        )
        .bind(course_id)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .context("Failed to attach book to course")?;

        Ok(())
    }

    async fn detach_from_course(&self, book_id: i64, course_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM course_books WHERE course_id = ? AND book_id = ?")
            .bind(course_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .context("Failed to detach book from course")?;

        Ok(())
    }

    async fn list_by_course(&self, course_id: i64) -> Result<Vec<Book>> {
        let columns = Book::COLUMNS
            .iter()
            .map(|col| format!("b.{}", col))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM books b \
             INNER JOIN course_books cb ON b.id = cb.book_id \
             WHERE cb.course_id = ? \
             ORDER BY b.name ASC",
            columns
        );
        let rows = sqlx::query(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list books by course")?;

        let mut books = Vec::new();
        for row in rows {
            books.push(Book::from_row(&row)?);
        }

        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::course::{CourseRepository, SqlxCourseRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateCourseInput;

    async fn setup_test_repo() -> (SqlitePool, SqlxBookRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxBookRepository::new(pool.clone());
        (pool, repo)
    }

    #[tokio::test]
    async fn test_create_and_get_book() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&Book::new(
                "978-0-00-000001-1".to_string(),
                "Algebra Basics".to_string(),
                "math".to_string(),
            ))
            .await
            .expect("Failed to create book");
        assert!(created.id > 0);

        let by_id = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get book")
            .expect("Book not found");
        assert_eq!(by_id.name, "Algebra Basics");

        let by_isbn = repo
            .get_by_isbn("978-0-00-000001-1")
            .await
            .expect("Failed to get book")
            .expect("Book not found");
        assert_eq!(by_isbn.id, created.id);

        assert!(repo
            .get_by_isbn("missing")
            .await
            .expect("Failed to get book")
            .is_none());
    }

    #[tokio::test]
    async fn test_get_by_ids() {
        let (_pool, repo) = setup_test_repo().await;

        let mut ids = Vec::new();
        for i in 1..=3 {
            let book = repo
                .create(&Book::new(
                    format!("isbn-{}", i),
                    format!("Book {}", i),
                    "math".to_string(),
                ))
                .await
                .expect("Failed to create book");
            ids.push(book.id);
        }

        let books = repo
            .get_by_ids(&[ids[0], ids[2], 99999])
            .await
            .expect("Failed to get books");
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].id, ids[0]);
        assert_eq!(books[1].id, ids[2]);

        let none = repo.get_by_ids(&[]).await.expect("Failed to get books");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_batch_keyed_on_isbn() {
        let (_pool, repo) = setup_test_repo().await;

        let existing = repo
            .create(&Book::new(
                "isbn-a".to_string(),
                "Old Title".to_string(),
                "math".to_string(),
            ))
            .await
            .expect("Failed to create book");

        let batch = vec![
            Book::new("isbn-a".to_string(), "New Title".to_string(), "math".to_string()),
            Book::new("isbn-b".to_string(), "Fresh".to_string(), "science".to_string()),
        ];
        let outcome = repo.upsert_batch(&batch).await.expect("Failed to upsert");
        assert_eq!(outcome.len(), 2);
        assert!(outcome.iter().all(|r| r.is_ok()));

        let refreshed = repo
            .get_by_isbn("isbn-a")
            .await
            .expect("Failed to get book")
            .expect("Book not found");
        assert_eq!(refreshed.id, existing.id); // Conflict keeps the row
        assert_eq!(refreshed.name, "New Title");

        assert!(repo
            .get_by_isbn("isbn-b")
            .await
            .expect("Failed to get book")
            .is_some());
    }

    #[tokio::test]
    async fn test_course_attachment() {
        let (pool, repo) = setup_test_repo().await;

        let courses = SqlxCourseRepository::new(pool.clone());
        let course = courses
            .create(&CreateCourseInput::new(
                "Algebra I".to_string(),
                "math".to_string(),
                7,
            ))
            .await
            .expect("Failed to create course");

        let zebra = repo
            .create(&Book::new("i-1".to_string(), "Zebra".to_string(), "math".to_string()))
            .await
            .expect("Failed to create book");
        let atlas = repo
            .create(&Book::new("i-2".to_string(), "Atlas".to_string(), "math".to_string()))
            .await
            .expect("Failed to create book");

        repo.attach_to_course(zebra.id, course.id)
            .await
            .expect("Failed to attach");
        repo.attach_to_course(atlas.id, course.id)
            .await
            .expect("Failed to attach");
        // Re-attaching is a no-op
        repo.attach_to_course(zebra.id, course.id)
            .await
            .expect("Re-attach should be a no-op");

        let attached = repo
            .list_by_course(course.id)
            .await
            .expect("Failed to list books");
        assert_eq!(
            attached.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(),
            vec!["Atlas", "Zebra"]
        );

        repo.detach_from_course(zebra.id, course.id)
            .await
            .expect("Failed to detach");
        let attached = repo
            .list_by_course(course.id)
            .await
            .expect("Failed to list books");
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].id, atlas.id);
    }
}
