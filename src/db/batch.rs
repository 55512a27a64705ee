//! Pipelined statement batches
//!
//! A [`Batch`] accumulates parameterized statements and sends them as a
//! unit over one pooled connection, draining one result per statement in
//! submission order. Batches are best effort per item: a failure on the
//! k-th statement surfaces as that statement's error and neither rolls
//! back earlier statements nor skips later ones. Callers that need
//! atomicity wrap the batch in an explicit transaction themselves.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::entity::{bind_all, BindValue};

/// One queued statement: SQL text plus its bound values
#[derive(Debug, Clone)]
struct Statement {
    sql: String,
    binds: Vec<BindValue>,
}

/// An accumulating statement batch
#[derive(Debug, Clone, Default)]
pub struct Batch {
    statements: Vec<Statement>,
}

/// Per-statement results of a sent batch, in submission order.
///
/// Always contains exactly as many entries as statements were queued.
pub type BatchOutcome = Vec<std::result::Result<u64, sqlx::Error>>;

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a statement with its bound values
    pub fn queue(&mut self, sql: impl Into<String>, binds: Vec<BindValue>) {
        self.statements.push(Statement {
            sql: sql.into(),
            binds,
        });
    }

    /// Number of queued statements
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Send all queued statements on one connection, in submission order.
    ///
    /// Returns one `Result` per statement (rows affected on success).
    /// Failed statements do not abort the batch; the error occupies that
    /// statement's slot and execution continues.
    pub async fn send(self, pool: &SqlitePool) -> Result<BatchOutcome> {
        let mut conn = pool
            .acquire()
            .await
            .context("Failed to acquire connection for batch")?;

        let mut outcome = Vec::with_capacity(self.statements.len());
        for (index, statement) in self.statements.into_iter().enumerate() {
            let query = bind_all(sqlx::query(&statement.sql), statement.binds);
            match query.execute(&mut *conn).await {
                Ok(result) => outcome.push(Ok(result.rows_affected())),
                Err(err) => {
                    tracing::debug!("Batch statement {} failed: {}", index, err);
                    outcome.push(Err(err));
                }
            }
        }

        Ok(outcome)
    }
}
