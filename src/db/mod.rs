//! Database layer
//!
//! SQLite access for the lectern data layer:
//! - `entity`: the field-mapped entity contract and shared SQL builders
//! - `batch`: pipelined statement batches with per-statement results
//! - `pool`: connection pool construction
//! - `migrations`: code-embedded, versioned schema migrations
//! - `repositories`: one repository per entity
//!
//! Every statement's column list, placeholder list, and upsert SET list is
//! derived from the entity contract through the `entity` helpers; no
//! repository duplicates that zip logic.

pub mod batch;
pub mod entity;
pub mod migrations;
pub mod pool;
pub mod repositories;

pub use batch::{Batch, BatchOutcome};
pub use entity::{BindValue, EntityError, Table};
pub use pool::{close, create_pool, create_test_pool, ping};
