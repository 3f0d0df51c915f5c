// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Schedule endpoints.

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, Result};
use crate::state::AppState;

use super::catalog::DeletedResponse;

/// Schedule as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    /// Schedule identifier.
    pub id: Uuid,
    /// Schedule name.
    pub name: String,
    /// Catalog item to launch.
    pub catalog_id: Uuid,
    /// Catalog item name, when known.
    pub catalog_name: Option<String>,
    /// Frequency ('daily', 'weekly', 'cron', ...).
    pub frequency: String,
    /// Cron expression when frequency is 'cron'.
    pub cron: Option<String>,
    /// Launch parameters.
    pub parameters: serde_json::Value,
    /// 'active' or 'paused'.
    pub status: String,
    /// Next planned launch time.
    pub next_run: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

fn parse_parameters(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or(serde_json::Value::Null)
}

impl From<db::ScheduleWithCatalog> for ScheduleResponse {
    fn from(schedule: db::ScheduleWithCatalog) -> Self {
        Self {
            id: schedule.id,
            name: schedule.name,
            catalog_id: schedule.catalog_id,
            catalog_name: Some(schedule.catalog_name),
            frequency: schedule.frequency,
            cron: schedule.cron,
            parameters: parse_parameters(&schedule.parameters),
            status: schedule.status,
            next_run: schedule.next_run,
            created_at: schedule.created_at,
        }
    }
}

impl From<db::ScheduleRecord> for ScheduleResponse {
    fn from(schedule: db::ScheduleRecord) -> Self {
        Self {
            id: schedule.id,
            name: schedule.name,
            catalog_id: schedule.catalog_id,
            catalog_name: None,
            frequency: schedule.frequency,
            cron: schedule.cron,
            parameters: parse_parameters(&schedule.parameters),
            status: schedule.status,
            next_run: schedule.next_run,
            created_at: schedule.created_at,
        }
    }
}

/// GET /schedules - list all schedules, soonest next run first.
pub async fn list_schedules(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduleResponse>>> {
    let schedules = db::list_schedules(&state.pool).await?;

    Ok(Json(
        schedules.into_iter().map(ScheduleResponse::from).collect(),
    ))
}

/// Request body for creating a schedule.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    /// Schedule name (required).
    pub name: String,
    /// Catalog item to launch (required, must exist).
    pub catalog_id: Uuid,
    /// Frequency (required).
    pub frequency: String,
    /// Cron expression when frequency is 'cron'.
    pub cron: Option<String>,
    /// Launch parameters.
    pub parameters: Option<serde_json::Value>,
    /// 'active' or 'paused'; defaults to 'active'.
    pub status: Option<String>,
    /// Next planned launch time.
    pub next_run: Option<DateTime<Utc>>,
    /// Who is creating the schedule.
    pub created_by: Option<String>,
}

/// POST /schedules - create a schedule.
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    if request.name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("name is required".to_string()));
    }
    if request.frequency.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "frequency is required".to_string(),
        ));
    }
    if request.frequency == "cron" && request.cron.as_deref().unwrap_or("").is_empty() {
        return Err(ApiError::InvalidRequest(
            "cron expression is required for cron frequency".to_string(),
        ));
    }

    let catalog = db::get_catalog_item(&state.pool, request.catalog_id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Catalog item",
            id: request.catalog_id.to_string(),
        })?;

    let parameters = request
        .parameters
        .unwrap_or_else(|| serde_json::json!({}))
        .to_string();
    let created_by = request.created_by.unwrap_or_else(|| "system".to_string());

    let schedule = db::create_schedule(
        &state.pool,
        &db::NewSchedule {
            name: request.name,
            catalog_id: request.catalog_id,
            frequency: request.frequency,
            cron: request.cron,
            parameters,
            status: request.status.unwrap_or_else(|| "active".to_string()),
            next_run: request.next_run,
        },
    )
    .await?;

    if let Err(e) = db::log_activity(
        &state.pool,
        "created",
        "schedule",
        &schedule.id.to_string(),
        &schedule.name,
        &created_by,
        &format!(
            "Created schedule \"{}\" for catalog item \"{}\"",
            schedule.name, catalog.name
        ),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    let mut response = ScheduleResponse::from(schedule);
    response.catalog_name = Some(catalog.name);

    Ok(Json(response))
}

/// GET /schedules/{id} - get a schedule.
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleResponse>> {
    let schedule = db::get_schedule(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Schedule",
            id: id.to_string(),
        })?;

    Ok(Json(ScheduleResponse::from(schedule)))
}

/// Request body for updating a schedule; absent fields are unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateScheduleRequest {
    /// New name.
    pub name: Option<String>,
    /// New frequency.
    pub frequency: Option<String>,
    /// New cron expression.
    pub cron: Option<String>,
    /// New launch parameters.
    pub parameters: Option<serde_json::Value>,
    /// New status ('active' or 'paused').
    pub status: Option<String>,
    /// New next planned launch time.
    pub next_run: Option<DateTime<Utc>>,
}

/// PUT /schedules/{id} - update a schedule.
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    if let Some(status) = request.status.as_deref()
        && status != "active"
        && status != "paused"
    {
        return Err(ApiError::InvalidRequest(
            "status must be 'active' or 'paused'".to_string(),
        ));
    }

    let parameters = request.parameters.map(|value| value.to_string());

    let updated = db::update_schedule(
        &state.pool,
        id,
        request.name.as_deref(),
        request.frequency.as_deref(),
        request.cron.as_deref(),
        parameters.as_deref(),
        request.status.as_deref(),
        request.next_run,
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound {
            entity: "Schedule",
            id: id.to_string(),
        });
    }

    let schedule = db::get_schedule(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Schedule",
            id: id.to_string(),
        })?;

    Ok(Json(ScheduleResponse::from(schedule)))
}

/// DELETE /schedules/{id} - delete a schedule.
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    let schedule = db::get_schedule(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Schedule",
            id: id.to_string(),
        })?;

    db::delete_schedule(&state.pool, id).await?;

    if let Err(e) = db::log_activity(
        &state.pool,
        "deleted",
        "schedule",
        &id.to_string(),
        &schedule.name,
        "system",
        &format!("Deleted schedule \"{}\"", schedule.name),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    Ok(Json(DeletedResponse { success: true }))
}
