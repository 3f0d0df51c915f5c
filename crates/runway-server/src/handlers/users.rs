// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! User directory endpoints.

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

/// User as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User identifier.
    pub id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Full display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role: 'user' or 'admin'.
    pub role: String,
    /// Office location.
    pub location: Option<String>,
    /// Department.
    pub department: Option<String>,
    /// Whether the account is enabled.
    pub enabled: bool,
    /// Whether the account is locked.
    pub locked: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<db::UserRecord> for UserResponse {
    fn from(user: db::UserRecord) -> Self {
        let name = format!("{} {}", user.first_name, user.last_name);
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            name,
            email: user.email,
            role: user.role,
            location: user.location,
            department: user.department,
            enabled: user.enabled,
            locked: user.locked,
            created_at: user.created_at,
        }
    }
}

/// GET /users - list all users.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>> {
    let users = db::list_users(&state.pool).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Given name (required).
    pub first_name: String,
    /// Family name (required).
    pub last_name: String,
    /// Email address (required, unique).
    pub email: String,
    /// Role; defaults to 'user'.
    pub role: Option<String>,
    /// Office location.
    pub location: Option<String>,
    /// Department.
    pub department: Option<String>,
    /// Enabled flag; defaults to true.
    pub enabled: Option<bool>,
    /// Locked flag; defaults to false.
    pub locked: Option<bool>,
}

/// POST /users - create a user.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>> {
    if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "firstName and lastName are required".to_string(),
        ));
    }
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(ApiError::InvalidRequest(
            "a valid email is required".to_string(),
        ));
    }
    let role = request.role.unwrap_or_else(|| "user".to_string());
    if role != "user" && role != "admin" {
        return Err(ApiError::InvalidRequest(
            "role must be 'user' or 'admin'".to_string(),
        ));
    }

    let user = match db::create_user(
        &state.pool,
        &db::NewUser {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            role,
            location: request.location,
            department: request.department,
            enabled: request.enabled.unwrap_or(true),
            locked: request.locked.unwrap_or(false),
        },
    )
    .await
    {
        Ok(user) => user,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::InvalidRequest(
                "a user with this email already exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = db::log_activity(
        &state.pool,
        "created",
        "user",
        &user.id.to_string(),
        &user.email,
        "system",
        &format!("Created user {}", user.email),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    Ok(Json(UserResponse::from(user)))
}

/// GET /users/{id} - get a user.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>> {
    let user = db::get_user(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "User",
            id: id.to_string(),
        })?;

    Ok(Json(UserResponse::from(user)))
}

/// Request body for updating a user; absent fields are unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New role.
    pub role: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New department.
    pub department: Option<String>,
    /// New enabled flag.
    pub enabled: Option<bool>,
    /// New locked flag.
    pub locked: Option<bool>,
}

/// PUT /users/{id} - update a user.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    if let Some(role) = request.role.as_deref()
        && role != "user"
        && role != "admin"
    {
        return Err(ApiError::InvalidRequest(
            "role must be 'user' or 'admin'".to_string(),
        ));
    }

    let updated = db::update_user(
        &state.pool,
        id,
        &db::UserUpdate {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            role: request.role,
            location: request.location,
            department: request.department,
            enabled: request.enabled,
            locked: request.locked,
        },
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    let user = db::get_user(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "User",
            id: id.to_string(),
        })?;

    Ok(Json(UserResponse::from(user)))
}

/// DELETE /users/{id} - delete a user.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    let user = db::get_user(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "User",
            id: id.to_string(),
        })?;

    db::delete_user(&state.pool, id).await?;

    if let Err(e) = db::log_activity(
        &state.pool,
        "deleted",
        "user",
        &id.to_string(),
        &user.email,
        "system",
        &format!("Deleted user {}", user.email),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    Ok(Json(DeletedResponse { success: true }))
}
