// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared application state for request handlers.

use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;

use runway_core::{PostgresCounterStore, RunIdAllocator};

/// State shared across all handlers.
///
/// Cheap to clone: the pool and HTTP client are handles, the allocator wraps
/// an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// Run-ID allocator backed by the same database.
    pub allocator: RunIdAllocator,
    /// Outbound HTTP client for the AWX API.
    pub http: reqwest::Client,
    /// When the server started (for uptime reporting).
    pub start_time: Instant,
    /// Server version string.
    pub version: String,
}

impl AppState {
    /// Build application state over a connected pool.
    pub fn new(pool: PgPool) -> Self {
        let allocator = RunIdAllocator::new(Arc::new(PostgresCounterStore::new(pool.clone())));
        Self {
            pool,
            allocator,
            http: reqwest::Client::new(),
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Server uptime in milliseconds.
    pub fn uptime_ms(&self) -> i64 {
        self.start_time.elapsed().as_millis() as i64
    }
}
