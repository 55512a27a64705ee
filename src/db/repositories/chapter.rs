//! Chapter repository
//!
//! Database operations for book chapters. Chapters are unique per
//! `(book_id, name)` and listed in `display_order`.

use crate::db::batch::{Batch, BatchOutcome};
use crate::db::entity::{self, upsert_sql, BindValue, Table};
use crate::models::Chapter;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

impl Table for Chapter {
    const TABLE: &'static str = "chapters";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "book_id",
        "name",
        "display_order",
        "created_at",
        "updated_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] =
        &["book_id", "name", "display_order", "created_at", "updated_at"];

    fn bind_values(&self) -> Vec<BindValue> {
        let mut values = vec![BindValue::from(self.id)];
        values.extend(self.insert_values());
        values
    }

    fn insert_values(&self) -> Vec<BindValue> {
        vec![
            self.book_id.into(),
            self.name.clone().into(),
            self.display_order.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            book_id: row.get("book_id"),
            name: row.get("name"),
            display_order: row.get("display_order"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Columns refreshed when an import hits an existing `(book_id, name)` pair
const UPSERT_UPDATE: &[&str] = &["display_order", "updated_at"];

/// Chapter repository trait
#[async_trait]
pub trait ChapterRepository: Send + Sync {
    /// Create a new chapter
    async fn create(&self, chapter: &Chapter) -> Result<Chapter>;

    /// Get chapter by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Chapter>>;

    /// Chapters of a book, ordered by `display_order`, then id
    async fn list_by_book(&self, book_id: i64) -> Result<Vec<Chapter>>;

    /// Count chapters of a book
    async fn count_by_book(&self, book_id: i64) -> Result<i64>;

    /// Batch upsert keyed on `(book_id, name)`; best effort per item
    async fn upsert_batch(&self, chapters: &[Chapter]) -> Result<BatchOutcome>;
}

/// SQLx-based chapter repository implementation
pub struct SqlxChapterRepository {
    pool: SqlitePool,
}

impl SqlxChapterRepository {
    /// Create a new SQLx chapter repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ChapterRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ChapterRepository for SqlxChapterRepository {
    async fn create(&self, chapter: &Chapter) -> Result<Chapter> {
        let now = Utc::now();
        let chapter = Chapter {
            created_at: now,
            updated_at: now,
            ..chapter.clone()
        };

        let id = entity::insert(&self.pool, &chapter)
            .await
            .context("Failed to create chapter")?;

        Ok(Chapter { id, ..chapter })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Chapter>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            entity::column_list::<Chapter>(),
            Chapter::TABLE
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get chapter by ID")?;

        match row {
            Some(row) => Ok(Some(Chapter::from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_book(&self, book_id: i64) -> Result<Vec<Chapter>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE book_id = ? ORDER BY display_order ASC, id ASC",
            entity::column_list::<Chapter>(),
            Chapter::TABLE
        );
        let rows = sqlx::query(&sql)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list chapters by book")?;

        let mut chapters = Vec::new();
        for row in rows {
            chapters.push(Chapter::from_row(&row)?);
        }

        Ok(chapters)
    }

    async fn count_by_book(&self, book_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM chapters WHERE book_id = ?")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count chapters by book")?;

        Ok(row.get("count"))
    }

    async fn upsert_batch(&self, chapters: &[Chapter]) -> Result<BatchOutcome> {
        let sql = upsert_sql::<Chapter>(&["book_id", "name"], UPSERT_UPDATE)?;

        let mut batch = Batch::new();
        for chapter in chapters {
            batch.queue(sql.clone(), chapter.insert_values());
        }
        batch.send(&self.pool).await
    }
}
