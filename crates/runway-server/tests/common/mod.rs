// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for runway-server integration tests.
//!
//! Provides TestContext for setting up the database and an in-process
//! router. Tests are skipped when `TEST_RUNWAY_DATABASE_URL` is not set.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use runway_server::state::AppState;
use runway_server::{create_router, db, migrations};

/// Test context that manages database and router for integration tests.
pub struct TestContext {
    pub pool: PgPool,
    pub app: Router,
}

impl TestContext {
    /// Create a new test context, or None when no test database is
    /// configured.
    pub async fn new() -> Option<Self> {
        let url = std::env::var("TEST_RUNWAY_DATABASE_URL").ok()?;

        let pool = PgPool::connect(&url).await.ok()?;
        migrations::run(&pool).await.ok()?;

        // Pin the AWX endpoint to the shipped placeholder so launches take
        // the demo-mode path regardless of the host environment.
        db::upsert_setting(
            &pool,
            "default_api_endpoint",
            "https://awx.example.com/api/v2",
        )
        .await
        .ok()?;

        let app = create_router(AppState::new(pool.clone()));

        Some(Self { pool, app })
    }

    /// Send a GET request and return (status, parsed JSON body).
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Send a PUT request with a JSON body.
    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("request should not error");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    /// Create a catalog item directly, returning its ID.
    pub async fn create_test_catalog_item(&self, name: &str) -> Value {
        let (status, body) = self
            .post(
                "/catalog",
                serde_json::json!({
                    "name": name,
                    "description": "integration test item",
                    "templateId": "42",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "catalog create failed: {}", body);
        body
    }
}
