// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::db;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Whether the server is healthy (database connected).
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Server uptime in milliseconds.
    pub uptime_ms: i64,
}

/// GET /health - server and database health.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = db::health_check(&state.pool).await.unwrap_or(false);

    Json(HealthResponse {
        healthy: db_healthy,
        version: state.version.clone(),
        uptime_ms: state.uptime_ms(),
    })
}
