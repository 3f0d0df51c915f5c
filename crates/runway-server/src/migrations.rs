// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database migrations for runway-server.
//!
//! The server extends runway-core's schema (the `run_counters` table) with
//! the application tables: catalog items, runs, directory entities, activity
//! log, and settings.
//!
//! Calling [`run`] applies both runway-core and server migrations in the
//! correct order. The migrations are merged into a single migrator so SQLx
//! sees them as one unified set.
//!
//! # Example
//!
//! ```ignore
//! use sqlx::PgPool;
//! use runway_server::migrations;
//!
//! let pool = PgPool::connect(&database_url).await?;
//! migrations::run(&pool).await?;
//! ```

use sqlx::migrate::{MigrateError, Migration, Migrator};
use std::borrow::Cow;

/// Server-specific migrations embedded at compile time.
///
/// These use version numbers starting at 20250101000000 to ensure
/// they sort after core migrations (001, 002, ...).
static APP_MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Combined migrator with both core and server migrations.
///
/// This struct implements a custom migration source that merges
/// runway-core's PostgreSQL migrations with the server migrations.
#[derive(Debug)]
struct CombinedMigrations;

impl<'s> sqlx::migrate::MigrationSource<'s> for CombinedMigrations {
    fn resolve(
        self,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<Vec<Migration>, Box<dyn std::error::Error + Send + Sync>>,
                > + Send
                + 's,
        >,
    > {
        Box::pin(async move {
            // Get core migrations
            let core_migrations: Vec<Migration> =
                runway_core::migrations::POSTGRES.iter().cloned().collect();

            // Get server migrations
            let app_migrations: Vec<Migration> = APP_MIGRATOR.iter().cloned().collect();

            // Combine and sort by version
            let mut all_migrations = core_migrations;
            all_migrations.extend(app_migrations);
            all_migrations.sort_by_key(|m| m.version);

            Ok(all_migrations)
        })
    }
}

/// PostgreSQL migrator with all migrations (core + server).
///
/// This is created lazily on first use since we need to merge migrations
/// from two sources at runtime.
pub async fn migrator() -> Result<Migrator, MigrateError> {
    Migrator::new(CombinedMigrations).await
}

/// Run all migrations (core + server).
///
/// Safe to call multiple times; already-applied migrations are skipped.
pub async fn run(pool: &sqlx::PgPool) -> Result<(), MigrateError> {
    let migrator = migrator().await?;
    migrator.run(pool).await
}

/// Get an iterator over all migrations (core + server).
///
/// Returns migrations sorted by version number.
pub fn iter() -> impl Iterator<Item = Cow<'static, Migration>> {
    let core_iter = runway_core::migrations::POSTGRES.iter().map(Cow::Borrowed);
    let app_iter = APP_MIGRATOR.iter().map(Cow::Borrowed);

    let mut all: Vec<_> = core_iter.chain(app_iter).collect();
    all.sort_by_key(|m| m.version);
    all.into_iter()
}
