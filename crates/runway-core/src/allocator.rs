// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Run-ID allocation: preview and reserve operations.
//!
//! The allocator is the only component that touches the counter table.
//! Preview and reserve are fully separate code paths: preview goes through
//! [`CounterStore::get_counter`] and can never reach the increment
//! statement; reserve goes through [`CounterStore::increment_counter`] and
//! never reads first.

use std::sync::Arc;

use chrono::{Datelike, Utc};

use crate::error::CoreError;
use crate::pool::pool_for_identifier;
use crate::store::{CounterRecord, CounterStore};
use crate::taskid::TaskId;

/// Identity of the caller requesting an allocation.
///
/// The email address is the preferred pool-selection key; the user ID is the
/// fallback. With neither present, allocation lands in the default pool.
#[derive(Debug, Clone, Default)]
pub struct CallerIdentity {
    /// Opaque user ID.
    pub id: Option<String>,
    /// User email address.
    pub email: Option<String>,
}

impl CallerIdentity {
    /// The identifier used for pool selection: email if present, else id.
    pub fn identifier(&self) -> Option<&str> {
        self.email
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.id.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Result of a non-committing preview.
///
/// The candidate is advisory only: a concurrent reservation on the same
/// (year, pool) may consume this sequence before the caller does.
#[derive(Debug, Clone)]
pub struct TaskIdPreview {
    /// The candidate task ID.
    pub task_id: TaskId,
    /// Pool the caller maps to.
    pub pool: char,
    /// Candidate sequence (stored sequence + 1, or 1 with no row).
    pub sequence: i64,
    /// Four-digit year of the partition.
    pub year: i32,
}

/// Counter usage statistics for one year.
#[derive(Debug, Clone)]
pub struct CounterStats {
    /// The year the statistics cover.
    pub year: i32,
    /// Counter rows for that year, ordered by pool code.
    pub pools: Vec<CounterRecord>,
    /// Sum of all pool sequences (total reservations committed).
    pub total_runs: i64,
}

/// Allocates run task IDs against a [`CounterStore`].
#[derive(Clone)]
pub struct RunIdAllocator {
    store: Arc<dyn CounterStore>,
}

impl RunIdAllocator {
    /// Create an allocator over the given counter store.
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Preview the next task ID for the caller without allocating it.
    pub async fn preview(&self, caller: &CallerIdentity) -> Result<TaskIdPreview, CoreError> {
        self.preview_for_year(current_year(), caller).await
    }

    /// Preview against an explicit year partition. Read-only.
    pub async fn preview_for_year(
        &self,
        year: i32,
        caller: &CallerIdentity,
    ) -> Result<TaskIdPreview, CoreError> {
        let pool = pool_for_identifier(caller.identifier());

        let sequence = match self.store.get_counter(year, pool).await? {
            Some(record) => record.sequence + 1,
            None => 1,
        };

        Ok(TaskIdPreview {
            task_id: TaskId::new(year, pool, sequence),
            pool,
            sequence,
            year,
        })
    }

    /// Reserve the next task ID for the caller.
    ///
    /// Commits the increment: the returned task ID is unique and will never
    /// be handed out again. On error nothing visible was mutated; a retry
    /// consumes a fresh sequence, so callers must not reserve twice for one
    /// logical run.
    pub async fn reserve(&self, caller: &CallerIdentity) -> Result<TaskId, CoreError> {
        self.reserve_for_year(current_year(), caller).await
    }

    /// Reserve against an explicit year partition.
    pub async fn reserve_for_year(
        &self,
        year: i32,
        caller: &CallerIdentity,
    ) -> Result<TaskId, CoreError> {
        let pool = pool_for_identifier(caller.identifier());
        let sequence = self.store.increment_counter(year, pool).await?;

        Ok(TaskId::new(year, pool, sequence))
    }

    /// Counter usage statistics for a year (current year when `None`).
    pub async fn stats(&self, year: Option<i32>) -> Result<CounterStats, CoreError> {
        let year = year.unwrap_or_else(current_year);
        let pools = self.store.list_counters(year).await?;
        let total_runs = pools.iter().map(|record| record.sequence).sum();

        Ok(CounterStats {
            year,
            pools,
            total_runs,
        })
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DEFAULT_POOL;
    use crate::store::SqliteCounterStore;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_allocator() -> RunIdAllocator {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory SQLite should connect");
        crate::migrations::SQLITE
            .run(&pool)
            .await
            .expect("migrations should run");
        RunIdAllocator::new(Arc::new(SqliteCounterStore::new(pool)))
    }

    fn caller(email: &str) -> CallerIdentity {
        CallerIdentity {
            id: None,
            email: Some(email.to_string()),
        }
    }

    #[test]
    fn test_identifier_prefers_email_over_id() {
        let identity = CallerIdentity {
            id: Some("user-1".to_string()),
            email: Some("admin@example.com".to_string()),
        };
        assert_eq!(identity.identifier(), Some("admin@example.com"));

        let identity = CallerIdentity {
            id: Some("user-1".to_string()),
            email: None,
        };
        assert_eq!(identity.identifier(), Some("user-1"));

        let identity = CallerIdentity {
            id: Some("user-1".to_string()),
            email: Some(String::new()),
        };
        assert_eq!(identity.identifier(), Some("user-1"));

        assert_eq!(CallerIdentity::default().identifier(), None);
    }

    #[tokio::test]
    async fn test_preview_with_no_counter_row() {
        let allocator = memory_allocator().await;

        let preview = allocator
            .preview_for_year(2025, &caller("admin@example.com"))
            .await
            .unwrap();

        assert_eq!(preview.sequence, 1);
        assert_eq!(preview.year, 2025);
        // "admin@example.com" hashes to pool D.
        assert_eq!(preview.pool, 'D');
        assert_eq!(preview.task_id.to_string(), "TASK25D0000000001i");
    }

    #[tokio::test]
    async fn test_preview_does_not_mutate() {
        let allocator = memory_allocator().await;
        let identity = caller("admin@example.com");

        allocator
            .reserve_for_year(2025, &identity)
            .await
            .unwrap();

        for _ in 0..10 {
            let preview = allocator
                .preview_for_year(2025, &identity)
                .await
                .unwrap();
            assert_eq!(preview.sequence, 2, "preview must not consume sequences");
        }

        // The next reservation gets the previewed sequence exactly once.
        let reserved = allocator
            .reserve_for_year(2025, &identity)
            .await
            .unwrap();
        assert_eq!(reserved.sequence(), 2);
    }

    #[tokio::test]
    async fn test_reserve_is_monotonic_with_no_repeats() {
        let allocator = memory_allocator().await;
        let identity = caller("admin@example.com");

        let mut sequences = Vec::new();
        for _ in 0..20 {
            let id = allocator
                .reserve_for_year(2025, &identity)
                .await
                .unwrap();
            sequences.push(id.sequence());
        }

        let mut sorted = sequences.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), sequences.len());
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_reserve_without_identity_uses_default_pool() {
        let allocator = memory_allocator().await;

        let id = allocator
            .reserve_for_year(2025, &CallerIdentity::default())
            .await
            .unwrap();

        assert_eq!(id.pool(), DEFAULT_POOL);
        assert_eq!(id.sequence(), 1);
    }

    #[tokio::test]
    async fn test_years_partition_independently() {
        let allocator = memory_allocator().await;
        let identity = caller("admin@example.com");

        allocator
            .reserve_for_year(2024, &identity)
            .await
            .unwrap();
        let id = allocator
            .reserve_for_year(2025, &identity)
            .await
            .unwrap();

        assert_eq!(id.sequence(), 1);
        assert_eq!(id.year_suffix(), 25);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_are_unique() {
        let allocator = memory_allocator().await;

        // All callers share one identity and therefore one pool partition.
        let mut handles = Vec::new();
        for _ in 0..100 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                allocator
                    .reserve_for_year(2025, &caller("admin@example.com"))
                    .await
                    .unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        let mut sequences: Vec<i64> = ids.iter().map(|id| id.sequence()).collect();
        sequences.sort_unstable();
        sequences.dedup();
        assert_eq!(sequences.len(), 100, "no duplicate sequences");

        let mut texts: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), 100, "no duplicate task IDs");

        // No lost increments.
        let stats = allocator.stats(Some(2025)).await.unwrap();
        assert_eq!(stats.total_runs, 100);
    }

    #[tokio::test]
    async fn test_stats_totals_across_pools() {
        let allocator = memory_allocator().await;

        // "a" -> C, "b" -> D (consecutive char codes walk the alphabet).
        allocator
            .reserve_for_year(2025, &caller("a"))
            .await
            .unwrap();
        allocator
            .reserve_for_year(2025, &caller("a"))
            .await
            .unwrap();
        allocator
            .reserve_for_year(2025, &caller("b"))
            .await
            .unwrap();

        let stats = allocator.stats(Some(2025)).await.unwrap();
        assert_eq!(stats.year, 2025);
        assert_eq!(stats.pools.len(), 2);
        assert_eq!(stats.total_runs, 3);
    }
}
