//! Lectern - data access layer for an education platform backend
//!
//! This library provides repository objects (users, students, courses,
//! classes, books, chapters, lessons, quizzes) over a SQLite database,
//! built around a shared entity-to-SQL mapping contract.

pub mod config;
pub mod db;
pub mod models;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and integration tests.
///
/// Respects `RUST_LOG`; defaults to `info` for this crate.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lectern=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
