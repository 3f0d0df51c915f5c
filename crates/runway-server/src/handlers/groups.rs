// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Group directory endpoints.

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

/// Group member as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberResponse {
    /// Member user ID.
    pub user_id: Uuid,
    /// Full display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl From<db::GroupMember> for GroupMemberResponse {
    fn from(member: db::GroupMember) -> Self {
        Self {
            user_id: member.user_id,
            name: format!("{} {}", member.first_name, member.last_name),
            email: member.email,
        }
    }
}

/// Group as serialized to clients, members included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    /// Group identifier.
    pub id: Uuid,
    /// Group name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Current members.
    pub members: Vec<GroupMemberResponse>,
}

async fn group_response(state: &AppState, group: db::GroupRecord) -> Result<GroupResponse> {
    let members = db::list_group_members(&state.pool, group.id).await?;

    Ok(GroupResponse {
        id: group.id,
        name: group.name,
        description: group.description,
        created_at: group.created_at,
        members: members.into_iter().map(GroupMemberResponse::from).collect(),
    })
}

/// GET /groups - list all groups with members.
pub async fn list_groups(State(state): State<AppState>) -> Result<Json<Vec<GroupResponse>>> {
    let groups = db::list_groups(&state.pool).await?;

    let mut responses = Vec::with_capacity(groups.len());
    for group in groups {
        responses.push(group_response(&state, group).await?);
    }

    Ok(Json(responses))
}

/// Request body for creating a group.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    /// Group name (required, unique).
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// POST /groups - create a group.
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<Json<GroupResponse>> {
    if request.name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("name is required".to_string()));
    }

    let group = match db::create_group(&state.pool, &request.name, &request.description).await {
        Ok(group) => group,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::InvalidRequest(
                "a group with this name already exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = db::log_activity(
        &state.pool,
        "created",
        "group",
        &group.id.to_string(),
        &group.name,
        "system",
        &format!("Created group \"{}\"", group.name),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    group_response(&state, group).await.map(Json)
}

/// GET /groups/{id} - get a group with members.
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>> {
    let group = db::get_group(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Group",
            id: id.to_string(),
        })?;

    group_response(&state, group).await.map(Json)
}

/// Request body for updating a group; absent fields are unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateGroupRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// PUT /groups/{id} - update a group.
pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>> {
    let updated = db::update_group(
        &state.pool,
        id,
        request.name.as_deref(),
        request.description.as_deref(),
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound {
            entity: "Group",
            id: id.to_string(),
        });
    }

    let group = db::get_group(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Group",
            id: id.to_string(),
        })?;

    group_response(&state, group).await.map(Json)
}

/// DELETE /groups/{id} - delete a group.
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    let group = db::get_group(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Group",
            id: id.to_string(),
        })?;

    db::delete_group(&state.pool, id).await?;

    if let Err(e) = db::log_activity(
        &state.pool,
        "deleted",
        "group",
        &id.to_string(),
        &group.name,
        "system",
        &format!("Deleted group \"{}\"", group.name),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    Ok(Json(DeletedResponse { success: true }))
}

/// GET /groups/{id}/members - list group members.
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GroupMemberResponse>>> {
    if db::get_group(&state.pool, id).await?.is_none() {
        return Err(ApiError::NotFound {
            entity: "Group",
            id: id.to_string(),
        });
    }

    let members = db::list_group_members(&state.pool, id).await?;

    Ok(Json(
        members.into_iter().map(GroupMemberResponse::from).collect(),
    ))
}

/// Request body for adding a group member.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    /// The user to add.
    pub user_id: Uuid,
}

/// POST /groups/{id}/members - add a user to a group.
pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> Result<Json<Vec<GroupMemberResponse>>> {
    if db::get_group(&state.pool, id).await?.is_none() {
        return Err(ApiError::NotFound {
            entity: "Group",
            id: id.to_string(),
        });
    }
    if db::get_user(&state.pool, request.user_id).await?.is_none() {
        return Err(ApiError::NotFound {
            entity: "User",
            id: request.user_id.to_string(),
        });
    }

    db::add_group_member(&state.pool, id, request.user_id).await?;

    let members = db::list_group_members(&state.pool, id).await?;

    Ok(Json(
        members.into_iter().map(GroupMemberResponse::from).collect(),
    ))
}

/// DELETE /groups/{id}/members/{userId} - remove a user from a group.
pub async fn remove_member(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeletedResponse>> {
    let removed = db::remove_group_member(&state.pool, id, user_id).await?;

    if !removed {
        return Err(ApiError::NotFound {
            entity: "Group member",
            id: user_id.to_string(),
        });
    }

    Ok(Json(DeletedResponse { success: true }))
}
