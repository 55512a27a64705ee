//! Database connection pool
//!
//! Pool construction for the SQLite backend. File-based databases get
//! their parent directory created and the file created on first use.
//! Foreign keys are a per-connection sqlite setting, so they are enabled
//! through the connect options rather than a one-off PRAGMA statement;
//! every connection the pool opens has them on.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DatabaseConfig;

/// Create a connection pool from configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let url = &config.url;

    let options = if url == ":memory:" || url.starts_with("sqlite::memory:") {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Failed to parse in-memory database options")?
    } else {
        let path = if url.starts_with("sqlite:") {
            url.trim_start_matches("sqlite:")
        } else {
            url
        };

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }

        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options.foreign_keys(true))
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    Ok(pool)
}

/// Check if the database connection is healthy
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database ping failed")?;
    Ok(())
}

/// Close the connection pool, waiting for checked-out connections
pub async fn close(pool: &SqlitePool) {
    pool.close().await;
}

/// Create an in-memory pool for tests
pub async fn create_test_pool() -> Result<SqlitePool> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
        // A single connection keeps every test statement on the same
        // in-memory database.
        max_connections: 1,
    };
    create_pool(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pool_creation() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        ping(&pool).await.expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_file_pool_creates_nested_directories() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

        let config = DatabaseConfig {
            url: db_path.to_string_lossy().to_string(),
            max_connections: 5,
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        ping(&pool).await.expect("Ping should succeed");
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_pool_close() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        close(&pool).await;
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("Failed to read pragma");
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled_on_every_pooled_connection() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            max_connections: 4,
        };
        let pool = create_pool(&config).await.expect("Failed to create pool");

        // Holding connections open forces the pool to dial fresh ones;
        // each must come up with the pragma already set.
        let mut conns = Vec::new();
        for _ in 0..4 {
            conns.push(pool.acquire().await.expect("Failed to acquire"));
        }
        for conn in conns.iter_mut() {
            let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
                .fetch_one(&mut **conn)
                .await
                .expect("Failed to read pragma");
            assert_eq!(row.0, 1);
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced_beyond_first_connection() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            max_connections: 4,
        };
        let pool = create_pool(&config).await.expect("Failed to create pool");
        crate::db::migrations::run_migrations(&pool)
            .await
            .expect("Failed to migrate");

        // Pin one connection so the violating insert must use another
        let _held = pool.acquire().await.expect("Failed to acquire");

        let result = sqlx::query(
            "INSERT INTO students (user_id, enrollment_number, grade_level) VALUES (?, ?, ?)",
        )
        .bind(99999i64)
        .bind("EN-ORPHAN")
        .bind(7i64)
        .execute(&pool)
        .await;
        assert!(result.is_err(), "orphan insert must hit the foreign key");
    }
}
