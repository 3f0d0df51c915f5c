//! Counter persistence for the run-ID allocator.
//!
//! This module defines the storage abstraction for the `run_counters` table
//! and its backend implementations.

pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresCounterStore;
pub use self::sqlite::SqliteCounterStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreError;

/// Counter row from the persistence layer: one per (year, pool).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CounterRecord {
    /// Four-digit calendar year of the partition.
    pub year: i32,
    /// Single-letter pool code.
    pub pool: String,
    /// Highest sequence number handed out so far (0 means none).
    pub sequence: i64,
    /// When the counter was last incremented.
    pub last_used: DateTime<Utc>,
}

/// Storage interface used by the allocator.
///
/// `increment` is the single correctness-critical operation: it must be one
/// atomic upsert-and-increment statement so that concurrent calls on the
/// same (year, pool) are linearized by the database row itself. Implementors
/// must never issue a read followed by a separate write.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read the counter row for (year, pool), if it exists. Read-only.
    async fn get_counter(
        &self,
        year: i32,
        pool: char,
    ) -> Result<Option<CounterRecord>, CoreError>;

    /// Atomically increment the counter for (year, pool), creating the row
    /// with sequence 1 if it does not exist. Returns the new sequence.
    async fn increment_counter(&self, year: i32, pool: char) -> Result<i64, CoreError>;

    /// List all counter rows for a year, ordered by pool code. Read-only.
    async fn list_counters(&self, year: i32) -> Result<Vec<CounterRecord>, CoreError>;
}
