//! SQLite-backed counter store.
//!
//! Used for embedded deployments and tests. The increment statement has the
//! same single-statement upsert shape as the PostgreSQL backend.

use std::path::Path;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::CoreError;

use super::{CounterRecord, CounterStore};

/// SQLite-backed counter store implementation.
#[derive(Clone)]
pub struct SqliteCounterStore {
    pool: SqlitePool,
}

impl SqliteCounterStore {
    /// Create a new SQLite counter store from an existing pool.
    ///
    /// The caller is responsible for having run the SQLite migrations
    /// (see [`crate::migrations::SQLITE`]).
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create and initialize a SQLite counter store from a file path.
    ///
    /// Creates parent directories and the database file if needed, connects,
    /// and runs migrations.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::DatabaseError {
                operation: "create_dir".to_string(),
                details: format!("Failed to create directory {:?}: {}", parent, e),
            })?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .map_err(|e| CoreError::DatabaseError {
                operation: "connect".to_string(),
                details: format!("Failed to connect to SQLite at {:?}: {}", path, e),
            })?;

        crate::migrations::SQLITE
            .run(&pool)
            .await
            .map_err(|e| CoreError::DatabaseError {
                operation: "migrate".to_string(),
                details: format!("Failed to run migrations: {}", e),
            })?;

        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl CounterStore for SqliteCounterStore {
    async fn get_counter(
        &self,
        year: i32,
        pool_code: char,
    ) -> Result<Option<CounterRecord>, CoreError> {
        let record = sqlx::query_as::<_, CounterRecord>(
            r#"
            SELECT year, pool, sequence, last_used
            FROM run_counters
            WHERE year = ? AND pool = ?
            "#,
        )
        .bind(year)
        .bind(pool_code.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn increment_counter(&self, year: i32, pool_code: char) -> Result<i64, CoreError> {
        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO run_counters (year, pool, sequence, last_used)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT (year, pool) DO UPDATE
            SET sequence = run_counters.sequence + 1,
                last_used = excluded.last_used
            RETURNING sequence
            "#,
        )
        .bind(year)
        .bind(pool_code.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError {
            operation: "increment_counter".to_string(),
            details: e.to_string(),
        })?;

        Ok(sequence)
    }

    async fn list_counters(&self, year: i32) -> Result<Vec<CounterRecord>, CoreError> {
        let records = sqlx::query_as::<_, CounterRecord>(
            r#"
            SELECT year, pool, sequence, last_used
            FROM run_counters
            WHERE year = ?
            ORDER BY pool ASC
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteCounterStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory SQLite should connect");
        crate::migrations::SQLITE
            .run(&pool)
            .await
            .expect("migrations should run");
        SqliteCounterStore::new(pool)
    }

    #[tokio::test]
    async fn test_first_increment_creates_row_at_one() {
        let store = memory_store().await;

        let sequence = store.increment_counter(2025, 'A').await.unwrap();
        assert_eq!(sequence, 1);

        let record = store.get_counter(2025, 'A').await.unwrap().unwrap();
        assert_eq!(record.sequence, 1);
        assert_eq!(record.year, 2025);
        assert_eq!(record.pool, "A");
    }

    #[tokio::test]
    async fn test_increment_is_monotonic_per_partition() {
        let store = memory_store().await;

        for expected in 1..=10 {
            let sequence = store.increment_counter(2025, 'B').await.unwrap();
            assert_eq!(sequence, expected);
        }
    }

    #[tokio::test]
    async fn test_partitions_are_independent() {
        let store = memory_store().await;

        store.increment_counter(2025, 'A').await.unwrap();
        store.increment_counter(2025, 'A').await.unwrap();
        assert_eq!(store.increment_counter(2025, 'B').await.unwrap(), 1);
        assert_eq!(store.increment_counter(2026, 'A').await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_counter_is_read_only() {
        let store = memory_store().await;

        store.increment_counter(2025, 'C').await.unwrap();
        for _ in 0..5 {
            let record = store.get_counter(2025, 'C').await.unwrap().unwrap();
            assert_eq!(record.sequence, 1);
        }
    }

    #[tokio::test]
    async fn test_list_counters_ordered_by_pool() {
        let store = memory_store().await;

        store.increment_counter(2025, 'C').await.unwrap();
        store.increment_counter(2025, 'A').await.unwrap();
        store.increment_counter(2024, 'B').await.unwrap();

        let records = store.list_counters(2025).await.unwrap();
        let pools: Vec<&str> = records.iter().map(|r| r.pool.as_str()).collect();
        assert_eq!(pools, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_from_path_initializes_schema() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SqliteCounterStore::from_path(dir.path().join("counters.db"))
            .await
            .unwrap();

        assert_eq!(store.increment_counter(2025, 'E').await.unwrap(), 1);
    }
}
