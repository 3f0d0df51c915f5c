// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Run-ID allocation endpoints and run listing.
//!
//! `GET /runs/next-id` is the non-committing preview: it never touches the
//! counter increment, so the returned ID is advisory only. `POST
//! /runs/reserve-id` commits an increment and the returned ID is unique
//! forever.

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use runway_core::CallerIdentity;

use crate::db;
use crate::error::{ApiError, Result};
use crate::state::AppState;

use super::UserRef;

// ============================================================================
// Preview
// ============================================================================

/// Query parameters for the preview endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextIdQuery {
    /// Caller user ID.
    pub user_id: Option<String>,
    /// Caller email (preferred for pool selection).
    pub user_email: Option<String>,
}

/// Preview response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextIdResponse {
    /// The candidate task ID (not reserved).
    pub next_task_id: String,
    /// Pool the caller maps to.
    pub pool: String,
    /// Candidate sequence number.
    pub sequence: i64,
    /// Year partition.
    pub year: i32,
}

/// GET /runs/next-id - preview the next task ID without consuming it.
pub async fn next_id(
    State(state): State<AppState>,
    Query(query): Query<NextIdQuery>,
) -> Result<Json<NextIdResponse>> {
    let caller = CallerIdentity {
        id: query.user_id,
        email: query.user_email,
    };

    let preview = state.allocator.preview(&caller).await?;

    Ok(Json(NextIdResponse {
        next_task_id: preview.task_id.to_string(),
        pool: preview.pool.to_string(),
        sequence: preview.sequence,
        year: preview.year,
    }))
}

// ============================================================================
// Reserve
// ============================================================================

/// Request body for the reserve endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReserveIdRequest {
    /// The caller; absent callers land in the default pool.
    pub user: Option<UserRef>,
}

/// Reserve response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveIdResponse {
    /// Always true on success.
    pub success: bool,
    /// The reserved, globally unique task ID.
    pub task_id: String,
    /// Human-readable confirmation.
    pub message: String,
}

/// POST /runs/reserve-id - reserve a task ID for an upcoming run.
pub async fn reserve_id(
    State(state): State<AppState>,
    Json(request): Json<ReserveIdRequest>,
) -> Result<Json<ReserveIdResponse>> {
    let caller = request
        .user
        .as_ref()
        .map(UserRef::identity)
        .unwrap_or_default();

    let task_id = state.allocator.reserve(&caller).await?;

    info!(task_id = %task_id, pool = %task_id.pool(), "task ID reserved");

    Ok(Json(ReserveIdResponse {
        success: true,
        task_id: task_id.to_string(),
        message: "Task ID reserved successfully".to_string(),
    }))
}

// ============================================================================
// Counter statistics
// ============================================================================

/// Query parameters for counter statistics.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Year to report on; defaults to the current year.
    pub year: Option<i32>,
}

/// Per-pool counter statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStat {
    /// Pool code.
    pub pool: String,
    /// Highest committed sequence.
    pub sequence: i64,
    /// When the pool was last used.
    pub last_used: DateTime<Utc>,
}

/// Counter statistics response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Year the statistics cover.
    pub year: i32,
    /// Per-pool breakdown, ordered by pool code.
    pub pools: Vec<PoolStat>,
    /// Total committed reservations across pools.
    pub total_runs: i64,
}

/// GET /runs/stats - counter usage statistics.
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>> {
    let stats = state.allocator.stats(query.year).await?;

    Ok(Json(StatsResponse {
        year: stats.year,
        pools: stats
            .pools
            .into_iter()
            .map(|record| PoolStat {
                pool: record.pool,
                sequence: record.sequence,
                last_used: record.last_used,
            })
            .collect(),
        total_runs: stats.total_runs,
    }))
}

// ============================================================================
// Run listing
// ============================================================================

/// Query parameters for listing runs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRunsQuery {
    /// Filter by run status.
    pub status: Option<String>,
    /// Filter by catalog item.
    pub catalog_id: Option<Uuid>,
    /// Maximum rows to return (capped at 100).
    pub limit: Option<i64>,
}

/// Run as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// Run identifier.
    pub id: Uuid,
    /// Catalog item identifier.
    pub catalog_id: Uuid,
    /// Catalog item name.
    pub catalog_name: String,
    /// Namespace display name (or machine name) of the item.
    pub namespace_name: Option<String>,
    /// Reserved task ID.
    pub task_id: String,
    /// Current status.
    pub status: String,
    /// Launch parameters.
    pub parameters: Option<serde_json::Value>,
    /// Who launched the run.
    pub executed_by: String,
    /// AWX job ID once launched.
    pub awx_job_id: Option<String>,
    /// Error message if the run failed.
    pub error_message: Option<String>,
    /// Whether the run was launched in demo mode.
    pub demo_mode: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub completed_at: Option<DateTime<Utc>>,
    /// Duration in whole seconds, when finished.
    pub duration: Option<i64>,
}

impl From<db::RunWithCatalog> for RunResponse {
    fn from(run: db::RunWithCatalog) -> Self {
        let duration = run
            .completed_at
            .map(|completed| (completed - run.started_at).num_seconds());
        let parameters = run
            .parameters
            .as_deref()
            .and_then(|text| serde_json::from_str(text).ok());

        Self {
            id: run.id,
            catalog_id: run.catalog_id,
            catalog_name: run.catalog_name,
            namespace_name: run.namespace_display_name.or(run.namespace_name),
            task_id: run.task_id,
            status: run.status,
            parameters,
            executed_by: run.executed_by,
            awx_job_id: run.awx_job_id,
            error_message: run.error_message,
            demo_mode: run.demo_mode,
            started_at: run.started_at,
            completed_at: run.completed_at,
            duration,
        }
    }
}

/// GET /runs - list runs with optional filters, newest first.
pub async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<ListRunsQuery>,
) -> Result<Json<Vec<RunResponse>>> {
    if let Some(status) = query.status.as_deref()
        && !db::is_valid_run_status(status)
    {
        return Err(ApiError::InvalidRequest(format!(
            "invalid status: '{}' (valid: pending, running, successful, failed, cancelled)",
            status
        )));
    }

    let limit = query.limit.unwrap_or(100).clamp(1, 100);

    let runs = db::list_runs(&state.pool, query.status.as_deref(), query.catalog_id, limit).await?;

    Ok(Json(runs.into_iter().map(RunResponse::from).collect()))
}
