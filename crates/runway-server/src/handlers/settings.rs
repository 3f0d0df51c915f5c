// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Settings endpoints.
//!
//! Key/value configuration; the AWX connection keys (`default_api_endpoint`,
//! `awx_token`) live here and take priority over environment variables.

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Setting as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingResponse {
    /// Setting key.
    pub key: String,
    /// Setting value.
    pub value: String,
    /// Last change time.
    pub updated_at: DateTime<Utc>,
}

impl From<db::SettingRecord> for SettingResponse {
    fn from(record: db::SettingRecord) -> Self {
        Self {
            key: record.key,
            value: record.value,
            updated_at: record.updated_at,
        }
    }
}

/// GET /settings - list all settings.
pub async fn list_settings(State(state): State<AppState>) -> Result<Json<Vec<SettingResponse>>> {
    let settings = db::list_settings(&state.pool).await?;

    Ok(Json(
        settings.into_iter().map(SettingResponse::from).collect(),
    ))
}

/// Request body for writing a setting.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    /// Setting key (required, non-empty).
    pub key: String,
    /// Setting value.
    pub value: String,
}

/// PUT /settings - insert or update a setting.
pub async fn update_setting(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingRequest>,
) -> Result<Json<SettingResponse>> {
    if request.key.trim().is_empty() {
        return Err(ApiError::InvalidRequest("key is required".to_string()));
    }

    db::upsert_setting(&state.pool, &request.key, &request.value).await?;

    info!(key = %request.key, "setting updated");

    let settings = db::list_settings(&state.pool).await?;
    let record = settings
        .into_iter()
        .find(|record| record.key == request.key)
        .ok_or_else(|| ApiError::NotFound {
            entity: "Setting",
            id: request.key.clone(),
        })?;

    Ok(Json(SettingResponse::from(record)))
}
