// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL-backed counter store.
//!
//! The increment path is a single upsert statement; the row-level lock taken
//! by `ON CONFLICT ... DO UPDATE` linearizes concurrent reservations on the
//! same (year, pool) without any application-side locking.

use sqlx::PgPool;

use crate::error::CoreError;

use super::{CounterRecord, CounterStore};

/// PostgreSQL-backed counter store implementation.
#[derive(Clone)]
pub struct PostgresCounterStore {
    pool: PgPool,
}

impl PostgresCounterStore {
    /// Create a new Postgres-backed counter store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Read the counter row for (year, pool).
pub async fn get_counter(
    pool: &PgPool,
    year: i32,
    pool_code: char,
) -> Result<Option<CounterRecord>, CoreError> {
    let record = sqlx::query_as::<_, CounterRecord>(
        r#"
        SELECT year, pool, sequence, last_used
        FROM run_counters
        WHERE year = $1 AND pool = $2
        "#,
    )
    .bind(year)
    .bind(pool_code.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Atomically increment the counter for (year, pool) and return the new
/// sequence. Creates the row with sequence 1 on first use.
pub async fn increment_counter(
    pool: &PgPool,
    year: i32,
    pool_code: char,
) -> Result<i64, CoreError> {
    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO run_counters (year, pool, sequence, last_used)
        VALUES ($1, $2, 1, NOW())
        ON CONFLICT (year, pool) DO UPDATE
        SET sequence = run_counters.sequence + 1,
            last_used = NOW()
        RETURNING sequence
        "#,
    )
    .bind(year)
    .bind(pool_code.to_string())
    .fetch_one(pool)
    .await
    .map_err(|e| CoreError::DatabaseError {
        operation: "increment_counter".to_string(),
        details: e.to_string(),
    })?;

    Ok(sequence)
}

/// List all counter rows for a year, ordered by pool code.
pub async fn list_counters(pool: &PgPool, year: i32) -> Result<Vec<CounterRecord>, CoreError> {
    let records = sqlx::query_as::<_, CounterRecord>(
        r#"
        SELECT year, pool, sequence, last_used
        FROM run_counters
        WHERE year = $1
        ORDER BY pool ASC
        "#,
    )
    .bind(year)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

#[async_trait::async_trait]
impl CounterStore for PostgresCounterStore {
    async fn get_counter(
        &self,
        year: i32,
        pool_code: char,
    ) -> Result<Option<CounterRecord>, CoreError> {
        get_counter(&self.pool, year, pool_code).await
    }

    async fn increment_counter(&self, year: i32, pool_code: char) -> Result<i64, CoreError> {
        increment_counter(&self.pool, year, pool_code).await
    }

    async fn list_counters(&self, year: i32) -> Result<Vec<CounterRecord>, CoreError> {
        list_counters(&self.pool, year).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations/postgresql");

    // Helper to get a test database pool
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.ok()?;
        MIGRATOR.run(&pool).await.ok()?;
        Some(pool)
    }

    // Helper to clear a (year, pool) partition so tests are repeatable
    async fn reset_counter(pool: &PgPool, year: i32, pool_code: char) {
        sqlx::query("DELETE FROM run_counters WHERE year = $1 AND pool = $2")
            .bind(year)
            .bind(pool_code.to_string())
            .execute(pool)
            .await
            .ok();
    }

    #[tokio::test]
    async fn test_first_increment_creates_row_at_one() {
        let Some(pool) = test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        };

        reset_counter(&pool, 3001, 'A').await;

        let sequence = increment_counter(&pool, 3001, 'A').await.unwrap();
        assert_eq!(sequence, 1);

        let record = get_counter(&pool, 3001, 'A').await.unwrap().unwrap();
        assert_eq!(record.sequence, 1);
        assert_eq!(record.pool, "A");

        reset_counter(&pool, 3001, 'A').await;
    }

    #[tokio::test]
    async fn test_sequential_increments_are_monotonic() {
        let Some(pool) = test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        };

        reset_counter(&pool, 3002, 'B').await;

        let mut last = 0;
        for _ in 0..5 {
            let sequence = increment_counter(&pool, 3002, 'B').await.unwrap();
            assert!(sequence > last);
            last = sequence;
        }
        assert_eq!(last, 5);

        reset_counter(&pool, 3002, 'B').await;
    }

    #[tokio::test]
    async fn test_get_counter_absent_row() {
        let Some(pool) = test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        };

        reset_counter(&pool, 3003, 'C').await;

        let record = get_counter(&pool, 3003, 'C').await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_pools_increment_independently() {
        let Some(pool) = test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        };

        reset_counter(&pool, 3004, 'A').await;
        reset_counter(&pool, 3004, 'B').await;

        increment_counter(&pool, 3004, 'A').await.unwrap();
        increment_counter(&pool, 3004, 'A').await.unwrap();
        let b = increment_counter(&pool, 3004, 'B').await.unwrap();
        assert_eq!(b, 1);

        let records = list_counters(&pool, 3004).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pool, "A");
        assert_eq!(records[0].sequence, 2);
        assert_eq!(records[1].pool, "B");
        assert_eq!(records[1].sequence, 1);

        reset_counter(&pool, 3004, 'A').await;
        reset_counter(&pool, 3004, 'B').await;
    }

    #[tokio::test]
    async fn test_concurrent_increments_yield_distinct_sequences() {
        let Some(pool) = test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        };

        reset_counter(&pool, 3005, 'D').await;

        let mut handles = Vec::new();
        for _ in 0..100 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                increment_counter(&pool, 3005, 'D').await.unwrap()
            }));
        }

        let mut sequences = Vec::new();
        for handle in handles {
            sequences.push(handle.await.unwrap());
        }

        sequences.sort_unstable();
        sequences.dedup();
        assert_eq!(sequences.len(), 100, "concurrent increments must not collide");

        // No lost increments: the stored value equals the number of commits.
        let record = get_counter(&pool, 3005, 'D').await.unwrap().unwrap();
        assert_eq!(record.sequence, 100);

        reset_counter(&pool, 3005, 'D').await;
    }
}
