// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database operations for runway-server.
//!
//! The server shares the database with runway-core's `run_counters` table
//! but owns the application tables: catalog items, runs, users, groups,
//! namespaces, schedules, activity, and settings. All access goes through
//! the query functions in this module.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

// ============================================================================
// Catalog Items
// ============================================================================

/// Catalog item record: one predefined automation job.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogItem {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Namespace this item belongs to, if any.
    pub namespace_id: Option<Uuid>,
    /// AWX job template ID launched by this item.
    pub template_id: String,
    /// JSON request-body template with `{{form.key}}` placeholders.
    pub custom_body: Option<String>,
    /// JSON form schema describing the launch parameters.
    pub form_schema: Option<String>,
    /// Whether the item is launchable.
    pub enabled: bool,
    /// Who created the item.
    pub created_by: String,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Catalog item with its namespace names joined in (for list views).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogItemWithNamespace {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Namespace this item belongs to, if any.
    pub namespace_id: Option<Uuid>,
    /// AWX job template ID launched by this item.
    pub template_id: String,
    /// Whether the item is launchable.
    pub enabled: bool,
    /// Who created the item.
    pub created_by: String,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// Namespace name (from namespaces table).
    pub namespace_name: Option<String>,
    /// Namespace display name (from namespaces table).
    pub namespace_display_name: Option<String>,
}

/// Fields for creating a catalog item.
#[derive(Debug, Clone)]
pub struct NewCatalogItem {
    /// Human-readable name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Namespace to file the item under.
    pub namespace_id: Option<Uuid>,
    /// AWX job template ID.
    pub template_id: String,
    /// JSON request-body template.
    pub custom_body: Option<String>,
    /// JSON form schema.
    pub form_schema: Option<String>,
    /// Whether the item is launchable.
    pub enabled: bool,
    /// Who created the item.
    pub created_by: String,
}

/// Partial update for a catalog item; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct CatalogItemUpdate {
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

/// Create a new catalog item.
pub async fn create_catalog_item(
    pool: &PgPool,
    new: &NewCatalogItem,
) -> Result<CatalogItem, sqlx::Error> {
    sqlx::query_as::<_, CatalogItem>(
        r#"
        INSERT INTO catalog_items
            (id, name, description, namespace_id, template_id, custom_body,
             form_schema, enabled, created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
        RETURNING id, name, description, namespace_id, template_id, custom_body,
                  form_schema, enabled, created_by, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.namespace_id)
    .bind(&new.template_id)
    .bind(&new.custom_body)
    .bind(&new.form_schema)
    .bind(new.enabled)
    .bind(&new.created_by)
    .fetch_one(pool)
    .await
}

/// Get a catalog item by ID.
pub async fn get_catalog_item(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<CatalogItem>, sqlx::Error> {
    sqlx::query_as::<_, CatalogItem>(
        r#"
        SELECT id, name, description, namespace_id, template_id, custom_body,
               form_schema, enabled, created_by, created_at, updated_at
        FROM catalog_items
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List catalog items with optional namespace/enabled filters.
pub async fn list_catalog_items(
    pool: &PgPool,
    namespace_id: Option<Uuid>,
    enabled: Option<bool>,
) -> Result<Vec<CatalogItemWithNamespace>, sqlx::Error> {
    sqlx::query_as::<_, CatalogItemWithNamespace>(
        r#"
        SELECT c.id, c.name, c.description, c.namespace_id, c.template_id,
               c.enabled, c.created_by, c.created_at,
               n.name as namespace_name, n.display_name as namespace_display_name
        FROM catalog_items c
        LEFT JOIN namespaces n ON c.namespace_id = n.id
        WHERE ($1::UUID IS NULL OR c.namespace_id = $1)
          AND ($2::BOOLEAN IS NULL OR c.enabled = $2)
        ORDER BY c.name ASC
        "#,
    )
    .bind(namespace_id)
    .bind(enabled)
    .fetch_all(pool)
    .await
}

/// Apply a partial update to a catalog item. Returns false if the item does
/// not exist.
pub async fn update_catalog_item(
    pool: &PgPool,
    id: Uuid,
    update: &CatalogItemUpdate,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE catalog_items
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            namespace_id = COALESCE($4, namespace_id),
            template_id = COALESCE($5, template_id),
            custom_body = COALESCE($6, custom_body),
            form_schema = COALESCE($7, form_schema),
            enabled = COALESCE($8, enabled),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.namespace_id)
    .bind(&update.template_id)
    .bind(&update.custom_body)
    .bind(&update.form_schema)
    .bind(update.enabled)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a catalog item. Returns false if the item does not exist.
pub async fn delete_catalog_item(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM catalog_items WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Runs
// ============================================================================

/// Run record: one launched (or attempted) execution of a catalog item.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RunRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Catalog item this run executed.
    pub catalog_id: Uuid,
    /// Reserved task ID (unique across all runs).
    pub task_id: String,
    /// Current status (pending, running, successful, failed, cancelled).
    pub status: String,
    /// Launch parameters as a JSON string.
    pub parameters: Option<String>,
    /// Who launched the run.
    pub executed_by: String,
    /// AWX job ID once the launch was accepted.
    pub awx_job_id: Option<String>,
    /// Error message if the run failed.
    pub error_message: Option<String>,
    /// Whether the run was launched in demo mode (AWX unconfigured).
    pub demo_mode: bool,
    /// When the run was created.
    pub started_at: DateTime<Utc>,
    /// When the run reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Run with catalog/namespace names joined in (for history views).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RunWithCatalog {
    /// Unique identifier.
    pub id: Uuid,
    /// Catalog item this run executed.
    pub catalog_id: Uuid,
    /// Reserved task ID.
    pub task_id: String,
    /// Current status.
    pub status: String,
    /// Launch parameters as a JSON string.
    pub parameters: Option<String>,
    /// Who launched the run.
    pub executed_by: String,
    /// AWX job ID once the launch was accepted.
    pub awx_job_id: Option<String>,
    /// Error message if the run failed.
    pub error_message: Option<String>,
    /// Whether the run was launched in demo mode.
    pub demo_mode: bool,
    /// When the run was created.
    pub started_at: DateTime<Utc>,
    /// When the run reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// Catalog item name.
    pub catalog_name: String,
    /// Namespace name, if the item has one.
    pub namespace_name: Option<String>,
    /// Namespace display name, if the item has one.
    pub namespace_display_name: Option<String>,
}

/// Whether an error is a unique-constraint violation (duplicate task ID,
/// duplicate email, ...).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Statuses in which a run is finished and `completed_at` must be set.
const TERMINAL_RUN_STATUSES: [&str; 3] = ["successful", "failed", "cancelled"];

/// Check whether a run status string is one of the known statuses.
pub fn is_valid_run_status(status: &str) -> bool {
    matches!(
        status,
        "pending" | "running" | "successful" | "failed" | "cancelled"
    )
}

/// Create a run record in 'pending' status.
pub async fn create_run(
    pool: &PgPool,
    catalog_id: Uuid,
    task_id: &str,
    parameters: Option<&str>,
    executed_by: &str,
) -> Result<RunRecord, sqlx::Error> {
    sqlx::query_as::<_, RunRecord>(
        r#"
        INSERT INTO runs (id, catalog_id, task_id, status, parameters, executed_by, started_at)
        VALUES ($1, $2, $3, 'pending'::run_status, $4, $5, NOW())
        RETURNING id, catalog_id, task_id, status::text as status, parameters,
                  executed_by, awx_job_id, error_message, demo_mode,
                  started_at, completed_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(catalog_id)
    .bind(task_id)
    .bind(parameters)
    .bind(executed_by)
    .fetch_one(pool)
    .await
}

/// Mark a run as launched: store the AWX job ID and move to 'running'.
pub async fn mark_run_launched(
    pool: &PgPool,
    id: Uuid,
    awx_job_id: &str,
    demo_mode: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE runs
        SET status = 'running'::run_status,
            awx_job_id = $2,
            demo_mode = $3
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(awx_job_id)
    .bind(demo_mode)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a run's status. Terminal statuses set `completed_at`; an error
/// message may accompany a failure. Returns false if the run does not exist.
pub async fn update_run_status(
    pool: &PgPool,
    id: Uuid,
    status: &str,
    error_message: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let terminal = TERMINAL_RUN_STATUSES.contains(&status);

    let result = sqlx::query(
        r#"
        UPDATE runs
        SET status = $2::run_status,
            error_message = COALESCE($3, error_message),
            completed_at = CASE WHEN $4 THEN NOW() ELSE completed_at END
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(error_message)
    .bind(terminal)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark a run cancelled, only if it is still pending or running.
///
/// Returns true if the update was applied, false if the run was already
/// terminal (or missing).
pub async fn cancel_run_if_active(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE runs
        SET status = 'cancelled'::run_status,
            completed_at = NOW()
        WHERE id = $1
          AND status IN ('pending', 'running')
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get a run with catalog details by ID.
pub async fn get_run(pool: &PgPool, id: Uuid) -> Result<Option<RunWithCatalog>, sqlx::Error> {
    sqlx::query_as::<_, RunWithCatalog>(
        r#"
        SELECT r.id, r.catalog_id, r.task_id, r.status::text as status,
               r.parameters, r.executed_by, r.awx_job_id, r.error_message,
               r.demo_mode, r.started_at, r.completed_at,
               c.name as catalog_name,
               n.name as namespace_name, n.display_name as namespace_display_name
        FROM runs r
        JOIN catalog_items c ON r.catalog_id = c.id
        LEFT JOIN namespaces n ON c.namespace_id = n.id
        WHERE r.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List runs with optional status/catalog filters, newest first.
pub async fn list_runs(
    pool: &PgPool,
    status: Option<&str>,
    catalog_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<RunWithCatalog>, sqlx::Error> {
    sqlx::query_as::<_, RunWithCatalog>(
        r#"
        SELECT r.id, r.catalog_id, r.task_id, r.status::text as status,
               r.parameters, r.executed_by, r.awx_job_id, r.error_message,
               r.demo_mode, r.started_at, r.completed_at,
               c.name as catalog_name,
               n.name as namespace_name, n.display_name as namespace_display_name
        FROM runs r
        JOIN catalog_items c ON r.catalog_id = c.id
        LEFT JOIN namespaces n ON c.namespace_id = n.id
        WHERE ($1::TEXT IS NULL OR r.status::text = $1)
          AND ($2::UUID IS NULL OR r.catalog_id = $2)
        ORDER BY r.started_at DESC
        LIMIT $3
        "#,
    )
    .bind(status)
    .bind(catalog_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

// ============================================================================
// Users
// ============================================================================

/// User record from the directory.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address (unique).
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
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
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
}

/// Partial update for a user; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
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

/// Create a new user.
pub async fn create_user(pool: &PgPool, new: &NewUser) -> Result<UserRecord, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(
        r#"
        INSERT INTO users (id, first_name, last_name, email, role, location,
                           department, enabled, locked, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        RETURNING id, first_name, last_name, email, role, location, department,
                  enabled, locked, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.email)
    .bind(&new.role)
    .bind(&new.location)
    .bind(&new.department)
    .bind(new.enabled)
    .bind(new.locked)
    .fetch_one(pool)
    .await
}

/// Get a user by ID.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(
        r#"
        SELECT id, first_name, last_name, email, role, location, department,
               enabled, locked, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List all users ordered by family name.
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(
        r#"
        SELECT id, first_name, last_name, email, role, location, department,
               enabled, locked, created_at
        FROM users
        ORDER BY last_name ASC, first_name ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Apply a partial update to a user. Returns false if the user does not
/// exist.
pub async fn update_user(
    pool: &PgPool,
    id: Uuid,
    update: &UserUpdate,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            email = COALESCE($4, email),
            role = COALESCE($5, role),
            location = COALESCE($6, location),
            department = COALESCE($7, department),
            enabled = COALESCE($8, enabled),
            locked = COALESCE($9, locked)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.email)
    .bind(&update.role)
    .bind(&update.location)
    .bind(&update.department)
    .bind(update.enabled)
    .bind(update.locked)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a user. Returns false if the user does not exist.
pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Groups
// ============================================================================

/// Group record from the directory.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Group name (unique).
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
}

/// Group member with user details joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupMember {
    /// Member user ID.
    pub user_id: Uuid,
    /// Member given name.
    pub first_name: String,
    /// Member family name.
    pub last_name: String,
    /// Member email address.
    pub email: String,
}

/// Create a new group.
pub async fn create_group(
    pool: &PgPool,
    name: &str,
    description: &str,
) -> Result<GroupRecord, sqlx::Error> {
    sqlx::query_as::<_, GroupRecord>(
        r#"
        INSERT INTO groups (id, name, description, created_at)
        VALUES ($1, $2, $3, NOW())
        RETURNING id, name, description, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

/// Get a group by ID.
pub async fn get_group(pool: &PgPool, id: Uuid) -> Result<Option<GroupRecord>, sqlx::Error> {
    sqlx::query_as::<_, GroupRecord>(
        r#"
        SELECT id, name, description, created_at
        FROM groups
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List all groups ordered by name.
pub async fn list_groups(pool: &PgPool) -> Result<Vec<GroupRecord>, sqlx::Error> {
    sqlx::query_as::<_, GroupRecord>(
        r#"
        SELECT id, name, description, created_at
        FROM groups
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Update a group's name/description. Returns false if the group does not
/// exist.
pub async fn update_group(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE groups
        SET name = COALESCE($2, name),
            description = COALESCE($3, description)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a group. Returns false if the group does not exist.
pub async fn delete_group(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM groups WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Add a user to a group. Adding an existing member is a no-op; returns
/// false in that case.
pub async fn add_group_member(
    pool: &PgPool,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO group_members (group_id, user_id, added_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (group_id, user_id) DO NOTHING
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a user from a group. Returns false if they were not a member.
pub async fn remove_group_member(
    pool: &PgPool,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM group_members
        WHERE group_id = $1 AND user_id = $2
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List the members of a group with user details.
pub async fn list_group_members(
    pool: &PgPool,
    group_id: Uuid,
) -> Result<Vec<GroupMember>, sqlx::Error> {
    sqlx::query_as::<_, GroupMember>(
        r#"
        SELECT u.id as user_id, u.first_name, u.last_name, u.email
        FROM group_members gm
        JOIN users u ON gm.user_id = u.id
        WHERE gm.group_id = $1
        ORDER BY u.last_name ASC, u.first_name ASC
        "#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await
}

// ============================================================================
// Namespaces
// ============================================================================

/// Namespace record: a grouping bucket for catalog items.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NamespaceRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Machine name (unique).
    pub name: String,
    /// Display name shown in the UI.
    pub display_name: String,
    /// Free-text description.
    pub description: String,
    /// Accent color (hex).
    pub color: String,
    /// Icon identifier.
    pub icon: String,
    /// Who created the namespace.
    pub created_by: String,
    /// When the namespace was created.
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a namespace.
#[derive(Debug, Clone)]
pub struct NewNamespace {
    /// Machine name.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Free-text description.
    pub description: String,
    /// Accent color (hex).
    pub color: String,
    /// Icon identifier.
    pub icon: String,
    /// Who created the namespace.
    pub created_by: String,
}

/// Create a new namespace.
pub async fn create_namespace(
    pool: &PgPool,
    new: &NewNamespace,
) -> Result<NamespaceRecord, sqlx::Error> {
    sqlx::query_as::<_, NamespaceRecord>(
        r#"
        INSERT INTO namespaces (id, name, display_name, description, color, icon,
                                created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING id, name, display_name, description, color, icon, created_by,
                  created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.display_name)
    .bind(&new.description)
    .bind(&new.color)
    .bind(&new.icon)
    .bind(&new.created_by)
    .fetch_one(pool)
    .await
}

/// Get a namespace by ID.
pub async fn get_namespace(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<NamespaceRecord>, sqlx::Error> {
    sqlx::query_as::<_, NamespaceRecord>(
        r#"
        SELECT id, name, display_name, description, color, icon, created_by,
               created_at
        FROM namespaces
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List all namespaces, newest first.
pub async fn list_namespaces(pool: &PgPool) -> Result<Vec<NamespaceRecord>, sqlx::Error> {
    sqlx::query_as::<_, NamespaceRecord>(
        r#"
        SELECT id, name, display_name, description, color, icon, created_by,
               created_at
        FROM namespaces
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Update a namespace's mutable fields. Returns false if it does not exist.
pub async fn update_namespace(
    pool: &PgPool,
    id: Uuid,
    display_name: Option<&str>,
    description: Option<&str>,
    color: Option<&str>,
    icon: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE namespaces
        SET display_name = COALESCE($2, display_name),
            description = COALESCE($3, description),
            color = COALESCE($4, color),
            icon = COALESCE($5, icon)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(display_name)
    .bind(description)
    .bind(color)
    .bind(icon)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a namespace. Returns false if it does not exist.
pub async fn delete_namespace(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM namespaces WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Schedules
// ============================================================================

/// Schedule record: a recurring launch of a catalog item.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduleRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Schedule name.
    pub name: String,
    /// Catalog item to launch.
    pub catalog_id: Uuid,
    /// Human-readable frequency ('daily', 'weekly', 'cron', ...).
    pub frequency: String,
    /// Cron expression when frequency is 'cron'.
    pub cron: Option<String>,
    /// Launch parameters as a JSON string.
    pub parameters: String,
    /// 'active' or 'paused'.
    pub status: String,
    /// Next planned launch time.
    pub next_run: Option<DateTime<Utc>>,
    /// When the schedule was created.
    pub created_at: DateTime<Utc>,
}

/// Schedule with the catalog item name joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduleWithCatalog {
    /// Unique identifier.
    pub id: Uuid,
    /// Schedule name.
    pub name: String,
    /// Catalog item to launch.
    pub catalog_id: Uuid,
    /// Human-readable frequency.
    pub frequency: String,
    /// Cron expression when frequency is 'cron'.
    pub cron: Option<String>,
    /// Launch parameters as a JSON string.
    pub parameters: String,
    /// 'active' or 'paused'.
    pub status: String,
    /// Next planned launch time.
    pub next_run: Option<DateTime<Utc>>,
    /// When the schedule was created.
    pub created_at: DateTime<Utc>,
    /// Catalog item name.
    pub catalog_name: String,
}

/// Fields for creating a schedule.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    /// Schedule name.
    pub name: String,
    /// Catalog item to launch.
    pub catalog_id: Uuid,
    /// Human-readable frequency.
    pub frequency: String,
    /// Cron expression when frequency is 'cron'.
    pub cron: Option<String>,
    /// Launch parameters as a JSON string.
    pub parameters: String,
    /// 'active' or 'paused'.
    pub status: String,
    /// Next planned launch time.
    pub next_run: Option<DateTime<Utc>>,
}

/// Create a new schedule.
pub async fn create_schedule(
    pool: &PgPool,
    new: &NewSchedule,
) -> Result<ScheduleRecord, sqlx::Error> {
    sqlx::query_as::<_, ScheduleRecord>(
        r#"
        INSERT INTO schedules (id, name, catalog_id, frequency, cron, parameters,
                               status, next_run, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        RETURNING id, name, catalog_id, frequency, cron, parameters, status,
                  next_run, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(new.catalog_id)
    .bind(&new.frequency)
    .bind(&new.cron)
    .bind(&new.parameters)
    .bind(&new.status)
    .bind(new.next_run)
    .fetch_one(pool)
    .await
}

/// Get a schedule by ID.
pub async fn get_schedule(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ScheduleRecord>, sqlx::Error> {
    sqlx::query_as::<_, ScheduleRecord>(
        r#"
        SELECT id, name, catalog_id, frequency, cron, parameters, status,
               next_run, created_at
        FROM schedules
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List all schedules ordered by next run time (soonest first).
pub async fn list_schedules(pool: &PgPool) -> Result<Vec<ScheduleWithCatalog>, sqlx::Error> {
    sqlx::query_as::<_, ScheduleWithCatalog>(
        r#"
        SELECT s.id, s.name, s.catalog_id, s.frequency, s.cron, s.parameters,
               s.status, s.next_run, s.created_at,
               c.name as catalog_name
        FROM schedules s
        JOIN catalog_items c ON s.catalog_id = c.id
        ORDER BY s.next_run ASC NULLS LAST
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Update a schedule's mutable fields. Returns false if it does not exist.
pub async fn update_schedule(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    frequency: Option<&str>,
    cron: Option<&str>,
    parameters: Option<&str>,
    status: Option<&str>,
    next_run: Option<DateTime<Utc>>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE schedules
        SET name = COALESCE($2, name),
            frequency = COALESCE($3, frequency),
            cron = COALESCE($4, cron),
            parameters = COALESCE($5, parameters),
            status = COALESCE($6, status),
            next_run = COALESCE($7, next_run)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(frequency)
    .bind(cron)
    .bind(parameters)
    .bind(status)
    .bind(next_run)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a schedule. Returns false if it does not exist.
pub async fn delete_schedule(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Activity Log
// ============================================================================

/// Activity record: one entry in the append-only audit trail.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRecord {
    /// Database primary key.
    pub id: i64,
    /// What happened ('created', 'executed', 'deleted', ...).
    pub action: String,
    /// Kind of entity affected ('run', 'catalog', 'schedule', ...).
    pub entity_type: String,
    /// Identifier of the affected entity.
    pub entity_id: String,
    /// Human-readable entity name at the time of the action.
    pub entity_name: String,
    /// Who performed the action.
    pub performed_by: String,
    /// Human-readable description.
    pub description: String,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}

/// Filter options for listing activity.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    /// Filter by entity type.
    pub entity_type: Option<String>,
    /// Filter by action.
    pub action: Option<String>,
    /// Filter by actor.
    pub performed_by: Option<String>,
}

/// Append an activity entry. Failures are the caller's business; mutating
/// flows log-and-continue rather than failing the request.
pub async fn log_activity(
    pool: &PgPool,
    action: &str,
    entity_type: &str,
    entity_id: &str,
    entity_name: &str,
    performed_by: &str,
    description: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO activity (action, entity_type, entity_id, entity_name,
                              performed_by, description, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        "#,
    )
    .bind(action)
    .bind(entity_type)
    .bind(entity_id)
    .bind(entity_name)
    .bind(performed_by)
    .bind(description)
    .execute(pool)
    .await?;

    Ok(())
}

/// List activity entries with filtering, newest first.
pub async fn list_activity(
    pool: &PgPool,
    filter: &ActivityFilter,
    limit: i64,
) -> Result<Vec<ActivityRecord>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRecord>(
        r#"
        SELECT id, action, entity_type, entity_id, entity_name, performed_by,
               description, created_at
        FROM activity
        WHERE ($1::TEXT IS NULL OR entity_type = $1)
          AND ($2::TEXT IS NULL OR action = $2)
          AND ($3::TEXT IS NULL OR performed_by = $3)
        ORDER BY created_at DESC, id DESC
        LIMIT $4
        "#,
    )
    .bind(&filter.entity_type)
    .bind(&filter.action)
    .bind(&filter.performed_by)
    .bind(limit)
    .fetch_all(pool)
    .await
}

// ============================================================================
// Settings
// ============================================================================

/// Setting record: one key/value configuration pair.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingRecord {
    /// Setting key.
    pub key: String,
    /// Setting value.
    pub value: String,
    /// When the value was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Get a setting value by key.
pub async fn get_setting(pool: &PgPool, key: &str) -> Result<Option<String>, sqlx::Error> {
    let value: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT value
        FROM settings
        WHERE key = $1
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(value.map(|row| row.0))
}

/// Insert or update a setting.
pub async fn upsert_setting(pool: &PgPool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (key) DO UPDATE
        SET value = EXCLUDED.value,
            updated_at = NOW()
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// List all settings ordered by key.
pub async fn list_settings(pool: &PgPool) -> Result<Vec<SettingRecord>, sqlx::Error> {
    sqlx::query_as::<_, SettingRecord>(
        r#"
        SELECT key, value, updated_at
        FROM settings
        ORDER BY key ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

// ============================================================================
// Health
// ============================================================================

/// Check database health.
pub async fn health_check(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let result: Result<(i32,), _> = sqlx::query_as("SELECT 1").fetch_one(pool).await;
    Ok(result.is_ok())
}
