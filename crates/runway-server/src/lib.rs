// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runway Server - Automation Catalog HTTP API
//!
//! This crate serves the runway web application: an automation catalog whose
//! items launch AWX (Ansible Tower) job templates, run tracking with
//! partitioned run-ID allocation, and directory administration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Web UI / Clients                      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 runway-server (This Crate)                  │
//! │  ┌──────────┐  ┌──────────┐  ┌───────────┐  ┌───────────┐   │
//! │  │ Catalog  │  │   Runs   │  │ Directory │  │ Activity  │   │
//! │  │ + Launch │  │ + IDs    │  │ Admin     │  │ + Settings│   │
//! │  └──────────┘  └──────────┘  └───────────┘  └───────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!          │                │                       │
//!          │ launch         │ reserve/preview       │
//!          ▼                ▼                       ▼
//! ┌──────────────┐  ┌──────────────┐  ┌─────────────────────────┐
//! │   AWX API    │  │ runway-core  │  │       PostgreSQL        │
//! │  (external)  │  │  allocator   │  │ (catalog, runs, users,  │
//! └──────────────┘  └──────────────┘  │  counters, activity)    │
//!                                     └─────────────────────────┘
//! ```
//!
//! # HTTP API
//!
//! ## Run-ID allocation
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/runs/next-id` | Preview the next task ID (read-only, advisory) |
//! | POST | `/runs/reserve-id` | Reserve a task ID (atomic, unique forever) |
//! | GET | `/runs/stats` | Counter usage per pool |
//! | GET | `/runs` | List runs with filters |
//!
//! ## Catalog
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET/POST | `/catalog` | List / create catalog items |
//! | GET/PUT/DELETE | `/catalog/{id}` | Read / update / delete an item |
//! | POST | `/catalog/{id}/execute` | Launch an item against AWX |
//! | GET | `/catalog/executions` | Execution history |
//! | GET/PUT | `/catalog/executions/{id}` | Read / update an execution |
//! | POST | `/catalog/executions/{id}/cancel` | Cancel an active execution |
//!
//! ## Administration
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET/POST | `/users`, `/groups`, `/namespaces`, `/schedules` | List / create |
//! | GET/PUT/DELETE | `/users/{id}` etc. | Read / update / delete |
//! | GET/POST | `/groups/{id}/members` | Membership |
//! | GET | `/activity` | Audit trail |
//! | GET/PUT | `/settings` | Key/value settings (AWX connection) |
//! | GET | `/health` | Health check |
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `RUNWAY_DATABASE_URL` | Yes | - | PostgreSQL connection string |
//! | `RUNWAY_HTTP_PORT` | No | `8080` | HTTP listen port |
//! | `RUNWAY_MAX_DB_CONNECTIONS` | No | `10` | Database pool size |
//! | `AWX_BASE_URL` | No | - | AWX API base URL (settings table wins) |
//! | `AWX_TOKEN` | No | - | AWX API token (settings table wins) |
//!
//! # Modules
//!
//! - [`awx`]: AWX API client and connection resolution
//! - [`config`]: Server configuration from environment variables
//! - [`db`]: PostgreSQL operations for the application tables
//! - [`error`]: API error type with HTTP response mapping
//! - [`handlers`]: Request handlers, one module per resource
//! - [`migrations`]: Combined core + server schema migrations
//! - [`routes`]: Router assembly
//! - [`state`]: Shared application state
//! - [`template`]: Request-body templating for launches

#![deny(missing_docs)]

/// AWX (Ansible Tower) API client.
pub mod awx;

/// Server configuration loaded from environment variables.
pub mod config;

/// PostgreSQL database operations for the application tables.
pub mod db;

/// Error types with HTTP response mapping.
pub mod error;

/// HTTP request handlers.
pub mod handlers;

/// Combined core + server database migrations.
pub mod migrations;

/// Router assembly.
pub mod routes;

/// Shared application state.
pub mod state;

/// Request-body templating for catalog launches.
pub mod template;

pub use config::Config;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
