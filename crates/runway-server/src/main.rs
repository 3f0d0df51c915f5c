// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runway Server - Automation Catalog HTTP API
//!
//! The server is responsible for:
//! - The automation catalog and its AWX launch flow
//! - Run tracking with partitioned run-ID allocation
//! - Directory administration (users, groups, namespaces, schedules)

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

use runway_server::config::Config;
use runway_server::routes::create_router;
use runway_server::state::AppState;
use runway_server::{db, migrations};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("runway_server=info".parse().unwrap()),
        )
        .init();

    info!("Starting Runway Server");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        http_addr = %config.http_addr,
        max_db_connections = config.max_db_connections,
        "Configuration loaded"
    );

    // Connect to database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;

    info!("Database connection established");

    // Verify connection
    let healthy = db::health_check(&pool).await?;
    info!(healthy, "Database health check passed");

    info!("Running database migrations...");
    migrations::run(&pool).await?;
    info!("Migrations completed");

    // Build shared state and router
    let state = AppState::new(pool.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, "Runway Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}
