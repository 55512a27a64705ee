//! Field-mapped entity contract
//!
//! Every persisted type implements [`Table`]: a stable table name, an
//! ordered column list, the bound values matching that list, and
//! row-to-entity construction. All statement text (column lists,
//! placeholder lists, INSERT and upsert statements) is derived from the
//! contract by the helpers here, so column/value consistency is guarded in
//! one place instead of being re-zipped in every repository.
//!
//! Upsert SET lists are generated BY NAME (`col = excluded.col`) from an
//! explicit update subset validated against the column list. A reordered
//! field list therefore either stays correct or fails loudly with
//! [`EntityError`]; it can no longer silently write one column's value
//! into another.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

/// Contract implemented by every persisted entity.
pub trait Table: Sized + Send + Sync {
    /// Table name
    const TABLE: &'static str;

    /// All columns, in the order `bind_values` produces them
    const COLUMNS: &'static [&'static str];

    /// Columns for plain INSERTs; excludes database-assigned keys.
    /// Ordered the way `insert_values` produces them.
    const INSERT_COLUMNS: &'static [&'static str];

    /// Bound values for every column in `COLUMNS`, in order
    fn bind_values(&self) -> Vec<BindValue>;

    /// Bound values for every column in `INSERT_COLUMNS`, in order
    fn insert_values(&self) -> Vec<BindValue>;

    /// Construct an entity from a fetched row
    fn from_row(row: &SqliteRow) -> Result<Self>;
}

/// Owned parameter value bridging entity fields and sqlx binds.
///
/// `Null` stands in for any SQL NULL; nullable fields convert via the
/// `From<Option<T>>` impl.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Integer(v)
    }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self {
        BindValue::Integer(v as i64)
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue::Real(v)
    }
}

impl From<bool> for BindValue {
    fn from(v: bool) -> Self {
        BindValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(v: DateTime<Utc>) -> Self {
        BindValue::Timestamp(v)
    }
}

impl From<Uuid> for BindValue {
    fn from(v: Uuid) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => BindValue::Null,
        }
    }
}

/// Errors raised when a statement request violates an entity's contract
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("column `{column}` is not part of table `{table}`")]
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    #[error("table `{table}` expects {expected} bound values, got {actual}")]
    ArityMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("upsert on table `{table}` needs at least one conflict column and one update column")]
    EmptyColumnSet { table: &'static str },
}

/// Comma-joined full column list for SELECTs
pub fn column_list<T: Table>() -> String {
    T::COLUMNS.join(", ")
}

/// `?, ?, ... ?` placeholder list of length `n`
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// `INSERT INTO <table> (<insert columns>) VALUES (<placeholders>)`
pub fn insert_sql<T: Table>() -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::INSERT_COLUMNS.join(", "),
        placeholders(T::INSERT_COLUMNS.len())
    )
}

/// Upsert over `INSERT_COLUMNS` for natural-key conflicts (the database
/// still assigns the id on fresh inserts).
///
/// The SET list is `col = excluded.col` for each update column, and both
/// subsets are validated against the insert column list.
pub fn upsert_sql<T: Table>(conflict: &[&str], update: &[&str]) -> Result<String, EntityError> {
    build_upsert::<T>(T::INSERT_COLUMNS, conflict, update)
}

/// Upsert over the full column list, conflicting on the primary key.
/// Used when the caller owns id assignment.
pub fn upsert_by_id_sql<T: Table>(update: &[&str]) -> Result<String, EntityError> {
    build_upsert::<T>(T::COLUMNS, &["id"], update)
}

fn build_upsert<T: Table>(
    columns: &[&str],
    conflict: &[&str],
    update: &[&str],
) -> Result<String, EntityError> {
    if conflict.is_empty() || update.is_empty() {
        return Err(EntityError::EmptyColumnSet { table: T::TABLE });
    }
    for column in conflict.iter().chain(update.iter()) {
        if !columns.contains(column) {
            return Err(EntityError::UnknownColumn {
                table: T::TABLE,
                column: column.to_string(),
            });
        }
    }

    let set_list = update
        .iter()
        .map(|col| format!("{col} = excluded.{col}"))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {}",
        T::TABLE,
        columns.join(", "),
        placeholders(columns.len()),
        conflict.join(", "),
        set_list
    ))
}

/// Bind a value list onto a query, in order
pub fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: Vec<BindValue>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            BindValue::Text(v) => query.bind(v),
            BindValue::Integer(v) => query.bind(v),
            BindValue::Real(v) => query.bind(v),
            BindValue::Bool(v) => query.bind(v),
            BindValue::Timestamp(v) => query.bind(v),
            BindValue::Null => query.bind(None::<String>),
        };
    }
    query
}

/// Insert an entity and return the database-assigned id.
///
/// The arity of `insert_values` against `INSERT_COLUMNS` is checked here,
/// the single place where columns and values are zipped.
pub async fn insert<T: Table>(pool: &SqlitePool, entity: &T) -> Result<i64> {
    let values = entity.insert_values();
    check_arity::<T>(T::INSERT_COLUMNS.len(), values.len())?;

    let sql = insert_sql::<T>();
    let result = bind_all(sqlx::query(&sql), values).execute(pool).await?;
    Ok(result.last_insert_rowid())
}

/// Execute a natural-key upsert built by [`upsert_sql`] for one entity
pub async fn upsert<T: Table>(
    pool: &SqlitePool,
    entity: &T,
    conflict: &[&str],
    update: &[&str],
) -> Result<u64> {
    let values = entity.insert_values();
    check_arity::<T>(T::INSERT_COLUMNS.len(), values.len())?;

    let sql = upsert_sql::<T>(conflict, update)?;
    let result = bind_all(sqlx::query(&sql), values).execute(pool).await?;
    Ok(result.rows_affected())
}

/// Execute an id-keyed upsert built by [`upsert_by_id_sql`] for one entity
pub async fn upsert_by_id<T: Table>(
    pool: &SqlitePool,
    entity: &T,
    update: &[&str],
) -> Result<u64> {
    let values = entity.bind_values();
    check_arity::<T>(T::COLUMNS.len(), values.len())?;

    let sql = upsert_by_id_sql::<T>(update)?;
    let result = bind_all(sqlx::query(&sql), values).execute(pool).await?;
    Ok(result.rows_affected())
}

fn check_arity<T: Table>(expected: usize, actual: usize) -> Result<(), EntityError> {
    if expected != actual {
        return Err(EntityError::ArityMismatch {
            table: T::TABLE,
            expected,
            actual,
        });
    }
    Ok(())
}
