// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Namespace endpoints.

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

/// Namespace as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceResponse {
    /// Namespace identifier.
    pub id: Uuid,
    /// Machine name.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Description.
    pub description: String,
    /// Accent color (hex).
    pub color: String,
    /// Icon identifier.
    pub icon: String,
    /// Who created the namespace.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<db::NamespaceRecord> for NamespaceResponse {
    fn from(namespace: db::NamespaceRecord) -> Self {
        Self {
            id: namespace.id,
            name: namespace.name,
            display_name: namespace.display_name,
            description: namespace.description,
            color: namespace.color,
            icon: namespace.icon,
            created_by: namespace.created_by,
            created_at: namespace.created_at,
        }
    }
}

/// GET /namespaces - list all namespaces, newest first.
pub async fn list_namespaces(
    State(state): State<AppState>,
) -> Result<Json<Vec<NamespaceResponse>>> {
    let namespaces = db::list_namespaces(&state.pool).await?;

    Ok(Json(
        namespaces.into_iter().map(NamespaceResponse::from).collect(),
    ))
}

/// Request body for creating a namespace.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNamespaceRequest {
    /// Machine name (required, unique).
    pub name: String,
    /// Display name; defaults to the machine name.
    pub display_name: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Accent color (hex).
    pub color: Option<String>,
    /// Icon identifier.
    pub icon: Option<String>,
    /// Who is creating the namespace.
    pub created_by: Option<String>,
}

/// POST /namespaces - create a namespace.
pub async fn create_namespace(
    State(state): State<AppState>,
    Json(request): Json<CreateNamespaceRequest>,
) -> Result<Json<NamespaceResponse>> {
    if request.name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("name is required".to_string()));
    }

    let display_name = request
        .display_name
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| request.name.clone());
    let created_by = request.created_by.unwrap_or_else(|| "system".to_string());

    let namespace = match db::create_namespace(
        &state.pool,
        &db::NewNamespace {
            name: request.name,
            display_name,
            description: request.description,
            color: request.color.unwrap_or_else(|| "#546aff".to_string()),
            icon: request.icon.unwrap_or_default(),
            created_by: created_by.clone(),
        },
    )
    .await
    {
        Ok(namespace) => namespace,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::InvalidRequest(
                "a namespace with this name already exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = db::log_activity(
        &state.pool,
        "created",
        "namespace",
        &namespace.id.to_string(),
        &namespace.name,
        &created_by,
        &format!("Created namespace \"{}\"", namespace.display_name),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    Ok(Json(NamespaceResponse::from(namespace)))
}

/// GET /namespaces/{id} - get a namespace.
pub async fn get_namespace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NamespaceResponse>> {
    let namespace = db::get_namespace(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Namespace",
            id: id.to_string(),
        })?;

    Ok(Json(NamespaceResponse::from(namespace)))
}

/// Request body for updating a namespace; absent fields are unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateNamespaceRequest {
    /// New display name.
    pub display_name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New accent color.
    pub color: Option<String>,
    /// New icon identifier.
    pub icon: Option<String>,
}

/// PUT /namespaces/{id} - update a namespace.
pub async fn update_namespace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateNamespaceRequest>,
) -> Result<Json<NamespaceResponse>> {
    let updated = db::update_namespace(
        &state.pool,
        id,
        request.display_name.as_deref(),
        request.description.as_deref(),
        request.color.as_deref(),
        request.icon.as_deref(),
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound {
            entity: "Namespace",
            id: id.to_string(),
        });
    }

    let namespace = db::get_namespace(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Namespace",
            id: id.to_string(),
        })?;

    Ok(Json(NamespaceResponse::from(namespace)))
}

/// DELETE /namespaces/{id} - delete a namespace.
pub async fn delete_namespace(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    let namespace = db::get_namespace(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Namespace",
            id: id.to_string(),
        })?;

    db::delete_namespace(&state.pool, id).await?;

    if let Err(e) = db::log_activity(
        &state.pool,
        "deleted",
        "namespace",
        &id.to_string(),
        &namespace.name,
        "system",
        &format!("Deleted namespace \"{}\"", namespace.display_name),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    Ok(Json(DeletedResponse { success: true }))
}
