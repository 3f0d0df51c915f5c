// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Activity log endpoints.

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::Result;
use crate::state::AppState;

/// Activity entry as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    /// Entry identifier.
    pub id: i64,
    /// What happened.
    pub action: String,
    /// Kind of entity affected.
    pub entity_type: String,
    /// Identifier of the affected entity.
    pub entity_id: String,
    /// Entity name at the time of the action.
    pub entity_name: String,
    /// Who performed the action.
    pub performed_by: String,
    /// Human-readable description.
    pub description: String,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}

impl From<db::ActivityRecord> for ActivityResponse {
    fn from(record: db::ActivityRecord) -> Self {
        Self {
            id: record.id,
            action: record.action,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            entity_name: record.entity_name,
            performed_by: record.performed_by,
            description: record.description,
            created_at: record.created_at,
        }
    }
}

/// Query parameters for listing activity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActivityQuery {
    /// Filter by entity type ('all' means no filter).
    pub entity_type: Option<String>,
    /// Filter by action ('all' means no filter).
    pub action: Option<String>,
    /// Filter by actor.
    pub performed_by: Option<String>,
    /// Maximum rows to return (default 50, capped at 200).
    pub limit: Option<i64>,
}

fn filter_value(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "all")
}

/// GET /activity - list activity entries, newest first.
pub async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<ListActivityQuery>,
) -> Result<Json<Vec<ActivityResponse>>> {
    let filter = db::ActivityFilter {
        entity_type: filter_value(query.entity_type),
        action: filter_value(query.action),
        performed_by: filter_value(query.performed_by),
    };
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let entries = db::list_activity(&state.pool, &filter, limit).await?;

    Ok(Json(
        entries.into_iter().map(ActivityResponse::from).collect(),
    ))
}
