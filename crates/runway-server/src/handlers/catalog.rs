// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Catalog item CRUD and the job-launch flow.
//!
//! Launching (`POST /catalog/{id}/execute`) is the path that consumes task
//! IDs: it uses a pre-reserved ID when the caller supplies one (callers must
//! not reserve twice for one logical run) and reserves a fresh one
//! otherwise, renders the item's request-body template, submits to AWX, and
//! records the outcome on the run.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use runway_core::TaskId;

use crate::awx::{AwxClient, AwxConfig, demo_job};
use crate::db;
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::template::render_template;

use super::UserRef;
use super::runs::RunResponse;

// ============================================================================
// Wire types
// ============================================================================

/// Catalog item as serialized to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemResponse {
    /// Item identifier.
    pub id: Uuid,
    /// Item name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Namespace identifier.
    pub namespace_id: Option<Uuid>,
    /// AWX job template ID.
    pub template_id: String,
    /// Request-body template (JSON text).
    pub custom_body: Option<String>,
    /// Form schema (JSON text).
    pub form_schema: Option<String>,
    /// Whether the item is launchable.
    pub enabled: bool,
    /// Who created the item.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<db::CatalogItem> for CatalogItemResponse {
    fn from(item: db::CatalogItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            namespace_id: item.namespace_id,
            template_id: item.template_id,
            custom_body: item.custom_body,
            form_schema: item.form_schema,
            enabled: item.enabled,
            created_by: item.created_by,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Catalog list entry with namespace names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListEntry {
    /// Item identifier.
    pub id: Uuid,
    /// Item name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Namespace identifier.
    pub namespace_id: Option<Uuid>,
    /// AWX job template ID.
    pub template_id: String,
    /// Whether the item is launchable.
    pub enabled: bool,
    /// Who created the item.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Namespace machine name.
    pub namespace_name: Option<String>,
    /// Namespace display name.
    pub namespace_display_name: Option<String>,
}

impl From<db::CatalogItemWithNamespace> for CatalogListEntry {
    fn from(item: db::CatalogItemWithNamespace) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            namespace_id: item.namespace_id,
            template_id: item.template_id,
            enabled: item.enabled,
            created_by: item.created_by,
            created_at: item.created_at,
            namespace_name: item.namespace_name,
            namespace_display_name: item.namespace_display_name,
        }
    }
}

fn validate_json_text(field: &str, text: &str) -> Result<()> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(|_| ())
        .map_err(|e| ApiError::InvalidRequest(format!("{} is not valid JSON: {}", field, e)))
}

// ============================================================================
// CRUD
// ============================================================================

/// Query parameters for listing catalog items.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCatalogQuery {
    /// Filter by namespace.
    pub namespace_id: Option<Uuid>,
    /// Filter by enabled flag.
    pub enabled: Option<bool>,
}

/// GET /catalog - list catalog items.
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListCatalogQuery>,
) -> Result<Json<Vec<CatalogListEntry>>> {
    let items = db::list_catalog_items(&state.pool, query.namespace_id, query.enabled).await?;

    Ok(Json(items.into_iter().map(CatalogListEntry::from).collect()))
}

/// Request body for creating a catalog item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCatalogRequest {
    /// Item name (required, non-empty).
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Namespace to file the item under.
    pub namespace_id: Option<Uuid>,
    /// AWX job template ID (required, non-empty).
    pub template_id: String,
    /// Request-body template (must be valid JSON text).
    pub custom_body: Option<String>,
    /// Form schema (must be valid JSON text).
    pub form_schema: Option<String>,
    /// Whether the item is launchable (default true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Who is creating the item.
    pub created_by: Option<String>,
}

fn default_true() -> bool {
    true
}

/// POST /catalog - create a catalog item.
pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateCatalogRequest>,
) -> Result<Json<CatalogItemResponse>> {
    if request.name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("name is required".to_string()));
    }
    if request.template_id.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "templateId is required".to_string(),
        ));
    }
    if let Some(body) = request.custom_body.as_deref() {
        validate_json_text("customBody", body)?;
    }
    if let Some(schema) = request.form_schema.as_deref() {
        validate_json_text("formSchema", schema)?;
    }

    let created_by = request.created_by.unwrap_or_else(|| "system".to_string());

    let item = db::create_catalog_item(
        &state.pool,
        &db::NewCatalogItem {
            name: request.name,
            description: request.description,
            namespace_id: request.namespace_id,
            template_id: request.template_id,
            custom_body: request.custom_body,
            form_schema: request.form_schema,
            enabled: request.enabled,
            created_by: created_by.clone(),
        },
    )
    .await?;

    if let Err(e) = db::log_activity(
        &state.pool,
        "created",
        "catalog",
        &item.id.to_string(),
        &item.name,
        &created_by,
        &format!("Created catalog item \"{}\"", item.name),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    Ok(Json(CatalogItemResponse::from(item)))
}

/// GET /catalog/{id} - get a catalog item.
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CatalogItemResponse>> {
    let item = db::get_catalog_item(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Catalog item",
            id: id.to_string(),
        })?;

    Ok(Json(CatalogItemResponse::from(item)))
}

/// Request body for updating a catalog item; absent fields are unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateCatalogRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New namespace.
    pub namespace_id: Option<Uuid>,
    /// New AWX job template ID.
    pub template_id: Option<String>,
    /// New request-body template.
    pub custom_body: Option<String>,
    /// New form schema.
    pub form_schema: Option<String>,
    /// New enabled flag.
    pub enabled: Option<bool>,
}

/// PUT /catalog/{id} - update a catalog item.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCatalogRequest>,
) -> Result<Json<CatalogItemResponse>> {
    if let Some(body) = request.custom_body.as_deref() {
        validate_json_text("customBody", body)?;
    }
    if let Some(schema) = request.form_schema.as_deref() {
        validate_json_text("formSchema", schema)?;
    }

    let updated = db::update_catalog_item(
        &state.pool,
        id,
        &db::CatalogItemUpdate {
            name: request.name,
            description: request.description,
            namespace_id: request.namespace_id,
            template_id: request.template_id,
            custom_body: request.custom_body,
            form_schema: request.form_schema,
            enabled: request.enabled,
        },
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound {
            entity: "Catalog item",
            id: id.to_string(),
        });
    }

    // Re-read for the response; the update already succeeded.
    let item = db::get_catalog_item(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Catalog item",
            id: id.to_string(),
        })?;

    Ok(Json(CatalogItemResponse::from(item)))
}

/// Deletion confirmation body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    /// Always true.
    pub success: bool,
}

/// DELETE /catalog/{id} - delete a catalog item (and its runs).
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    let item = db::get_catalog_item(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Catalog item",
            id: id.to_string(),
        })?;

    db::delete_catalog_item(&state.pool, id).await?;

    if let Err(e) = db::log_activity(
        &state.pool,
        "deleted",
        "catalog",
        &id.to_string(),
        &item.name,
        "system",
        &format!("Deleted catalog item \"{}\"", item.name),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    Ok(Json(DeletedResponse { success: true }))
}

// ============================================================================
// Launch flow
// ============================================================================

/// Request body for executing a catalog item.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecuteRequest {
    /// Launch parameters substituted into the body template.
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,
    /// Task ID previously obtained from POST /runs/reserve-id.
    pub reserved_task_id: Option<String>,
    /// Full replacement request body (skips the template).
    pub custom_body_override: Option<serde_json::Value>,
    /// The launching user.
    pub user: Option<UserRef>,
}

/// Launch confirmation body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    /// Always true on success.
    pub success: bool,
    /// Identifier of the created run record.
    pub run_id: Uuid,
    /// Task ID attached to the run.
    pub task_id: String,
    /// AWX job ID (simulated in demo mode).
    pub awx_job_id: Option<String>,
    /// Whether the launch ran in demo mode.
    pub demo_mode: bool,
    /// Human-readable confirmation.
    pub message: String,
}

/// POST /catalog/{id}/execute - launch a catalog item against AWX.
pub async fn execute_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>> {
    let item = db::get_catalog_item(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Catalog item",
            id: id.to_string(),
        })?;

    if !item.enabled {
        return Err(ApiError::InvalidRequest(
            "catalog item is disabled".to_string(),
        ));
    }

    let user = request.user.clone().unwrap_or_default();
    let executed_by = user.display_name();
    let parameters = request.parameters.clone().unwrap_or_default();

    // Use the pre-reserved task ID when given; reserve a fresh one otherwise.
    let task_id = match request.reserved_task_id.as_deref() {
        Some(reserved) => {
            let parsed: TaskId = reserved
                .parse()
                .map_err(|_| ApiError::InvalidRequest(format!("invalid task ID: {}", reserved)))?;
            parsed.to_string()
        }
        None => state.allocator.reserve(&user.identity()).await?.to_string(),
    };

    let request_body = build_request_body(&item, &request, &parameters)?;

    let parameters_text = if parameters.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(parameters.clone()).to_string())
    };

    let run = match db::create_run(
        &state.pool,
        item.id,
        &task_id,
        parameters_text.as_deref(),
        &executed_by,
    )
    .await
    {
        Ok(run) => run,
        // A reserved ID is single-use; a duplicate means the caller already
        // attached it to another run.
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::InvalidRequest(format!(
                "task ID {} is already attached to a run",
                task_id
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let config = AwxConfig::resolve(&state.pool).await;

    let (job, demo_mode) = if config.is_configured() {
        let client = AwxClient::new(state.http.clone(), config);
        match client.launch_job_template(&item.template_id, &request_body).await {
            Ok(job) => (job, false),
            Err(e) => {
                db::update_run_status(&state.pool, run.id, "failed", Some(&e.to_string()))
                    .await?;
                return Err(e);
            }
        }
    } else {
        info!(catalog = %item.name, "AWX not configured; launching in demo mode");
        (demo_job(), true)
    };

    let awx_job_id = job.job_id().map(|id| id.to_string());
    if let Some(job_id) = awx_job_id.as_deref() {
        db::mark_run_launched(&state.pool, run.id, job_id, demo_mode).await?;
    }
    if demo_mode {
        // Demo launches finish immediately with a simulated success.
        db::update_run_status(&state.pool, run.id, "successful", None).await?;
    }

    if let Err(e) = db::log_activity(
        &state.pool,
        "executed",
        "run",
        &task_id,
        &item.name,
        &executed_by,
        &format!("Launched \"{}\" as {}", item.name, task_id),
    )
    .await
    {
        warn!(error = %e, "failed to record activity");
    }

    info!(
        run_id = %run.id,
        task_id = %task_id,
        awx_job_id = ?awx_job_id,
        demo_mode,
        "catalog item launched"
    );

    Ok(Json(ExecuteResponse {
        success: true,
        run_id: run.id,
        task_id,
        awx_job_id,
        demo_mode,
        message: "Job launched successfully".to_string(),
    }))
}

/// Build the AWX request body: override > item template > bare extra_vars.
fn build_request_body(
    item: &db::CatalogItem,
    request: &ExecuteRequest,
    parameters: &serde_json::Map<String, serde_json::Value>,
) -> Result<serde_json::Value> {
    if let Some(body) = &request.custom_body_override {
        return Ok(body.clone());
    }

    if let Some(template_text) = item.custom_body.as_deref() {
        let template: serde_json::Value =
            serde_json::from_str(template_text).map_err(|e| {
                ApiError::InvalidRequest(format!("catalog item has invalid customBody: {}", e))
            })?;
        return Ok(render_template(&template, parameters));
    }

    Ok(serde_json::json!({ "extra_vars": parameters }))
}

// ============================================================================
// Executions
// ============================================================================

/// Query parameters for listing executions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListExecutionsQuery {
    /// Filter by catalog item.
    pub catalog_id: Option<Uuid>,
}

/// GET /catalog/executions - last 100 executions, newest first.
pub async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<ListExecutionsQuery>,
) -> Result<Json<Vec<RunResponse>>> {
    let runs = db::list_runs(&state.pool, None, query.catalog_id, 100).await?;

    Ok(Json(runs.into_iter().map(RunResponse::from).collect()))
}

/// GET /catalog/executions/{id} - one execution.
pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunResponse>> {
    let run = db::get_run(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Run",
            id: id.to_string(),
        })?;

    Ok(Json(RunResponse::from(run)))
}

/// Request body for updating an execution's status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExecutionRequest {
    /// New status (pending, running, successful, failed, cancelled).
    pub status: String,
    /// Error message for failures.
    pub error_message: Option<String>,
}

/// PUT /catalog/executions/{id} - update an execution's status.
pub async fn update_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExecutionRequest>,
) -> Result<Json<RunResponse>> {
    if !db::is_valid_run_status(&request.status) {
        return Err(ApiError::InvalidRequest(format!(
            "invalid status: '{}' (valid: pending, running, successful, failed, cancelled)",
            request.status
        )));
    }

    let updated = db::update_run_status(
        &state.pool,
        id,
        &request.status,
        request.error_message.as_deref(),
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound {
            entity: "Run",
            id: id.to_string(),
        });
    }

    let run = db::get_run(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Run",
            id: id.to_string(),
        })?;

    Ok(Json(RunResponse::from(run)))
}

/// POST /catalog/executions/{id}/cancel - cancel a pending/running execution.
pub async fn cancel_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunResponse>> {
    let cancelled = db::cancel_run_if_active(&state.pool, id).await?;

    if !cancelled {
        // Distinguish "missing" from "already finished" for the caller.
        return match db::get_run(&state.pool, id).await? {
            Some(run) => Err(ApiError::InvalidRequest(format!(
                "run is already {}",
                run.status
            ))),
            None => Err(ApiError::NotFound {
                entity: "Run",
                id: id.to_string(),
            }),
        };
    }

    let run = db::get_run(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Run",
            id: id.to_string(),
        })?;

    Ok(Json(RunResponse::from(run)))
}
