// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Integration tests for the run-ID allocation endpoints.
//!
//! Preview and reserve share the live counter table, so tests that assert
//! exact sequences serialize on COUNTER_LOCK; uniqueness tests only need
//! relative guarantees and run concurrently.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestContext;

// Serializes tests that assert exact counter values.
static COUNTER_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

fn unique_email(tag: &str) -> String {
    format!("{}-{}@example.com", tag, uuid::Uuid::new_v4().simple())
}

fn sequence_of(task_id: &str) -> i64 {
    // TASK + YY + P + ten digits + i
    task_id[7..17].parse().expect("task ID carries a sequence")
}

#[tokio::test]
async fn test_preview_shape_and_format() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_RUNWAY_DATABASE_URL not set");
        return;
    };

    let (status, body) = ctx
        .get("/runs/next-id?userEmail=admin@example.com")
        .await;

    assert_eq!(status, StatusCode::OK);

    // "admin@example.com" always hashes to pool D.
    assert_eq!(body["pool"], "D");

    let task_id = body["nextTaskId"].as_str().unwrap();
    let year = body["year"].as_i64().unwrap();
    let sequence = body["sequence"].as_i64().unwrap();

    assert_eq!(task_id.len(), 18);
    assert!(task_id.starts_with("TASK"));
    assert!(task_id.ends_with('i'));
    assert_eq!(&task_id[4..6], format!("{:02}", year % 100));
    assert_eq!(&task_id[6..7], "D");
    assert_eq!(sequence_of(task_id), sequence);
}

#[tokio::test]
async fn test_preview_is_read_only() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_RUNWAY_DATABASE_URL not set");
        return;
    };
    let _lock = COUNTER_LOCK.lock().await;

    let email = unique_email("preview");
    let uri = format!("/runs/next-id?userEmail={}", email);

    let (_, first) = ctx.get(&uri).await;

    // Repeated previews never consume the sequence.
    for _ in 0..5 {
        let (status, body) = ctx.get(&uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sequence"], first["sequence"]);
        assert_eq!(body["nextTaskId"], first["nextTaskId"]);
    }

    // The next reservation takes exactly the previewed sequence.
    let (status, reserved) = ctx
        .post("/runs/reserve-id", json!({ "user": { "email": email } }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        reserved["taskId"].as_str().unwrap(),
        first["nextTaskId"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_reserve_response_shape() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_RUNWAY_DATABASE_URL not set");
        return;
    };
    let _lock = COUNTER_LOCK.lock().await;

    let (status, body) = ctx
        .post(
            "/runs/reserve-id",
            json!({ "user": { "email": unique_email("shape") } }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Task ID reserved successfully");
    assert_eq!(body["taskId"].as_str().unwrap().len(), 18);
}

#[tokio::test]
async fn test_reserve_without_user_uses_default_pool() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_RUNWAY_DATABASE_URL not set");
        return;
    };
    let _lock = COUNTER_LOCK.lock().await;

    let (status, body) = ctx.post("/runs/reserve-id", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    let task_id = body["taskId"].as_str().unwrap();
    assert_eq!(&task_id[6..7], "A", "no identity lands in the default pool");
}

#[tokio::test]
async fn test_sequential_reservations_are_monotonic() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_RUNWAY_DATABASE_URL not set");
        return;
    };
    let _lock = COUNTER_LOCK.lock().await;

    let email = unique_email("monotonic");
    let mut last = 0;
    for _ in 0..5 {
        let (status, body) = ctx
            .post("/runs/reserve-id", json!({ "user": { "email": email } }))
            .await;
        assert_eq!(status, StatusCode::OK);
        let sequence = sequence_of(body["taskId"].as_str().unwrap());
        assert!(sequence > last, "sequences must strictly increase");
        last = sequence;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_are_distinct() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_RUNWAY_DATABASE_URL not set");
        return;
    };
    let _lock = COUNTER_LOCK.lock().await;

    let email = unique_email("concurrent");

    let mut handles = Vec::new();
    for _ in 0..50 {
        let app = ctx.app.clone();
        let email = email.clone();
        handles.push(tokio::spawn(async move {
            use axum::body::Body;
            use axum::http::{Request, header};
            use http_body_util::BodyExt;
            use tower::ServiceExt;

            let request = Request::builder()
                .method("POST")
                .uri("/runs/reserve-id")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "user": { "email": email } }).to_string(),
                ))
                .unwrap();

            let response = app.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            body["taskId"].as_str().unwrap().to_string()
        }));
    }

    let mut task_ids = Vec::new();
    for handle in handles {
        task_ids.push(handle.await.unwrap());
    }

    task_ids.sort_unstable();
    task_ids.dedup();
    assert_eq!(task_ids.len(), 50, "concurrent reservations must not collide");
}

#[tokio::test]
async fn test_stats_reflect_reservations() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_RUNWAY_DATABASE_URL not set");
        return;
    };
    let _lock = COUNTER_LOCK.lock().await;

    let (_, before) = ctx.get("/runs/stats").await;
    let total_before = before["totalRuns"].as_i64().unwrap_or(0);

    for _ in 0..3 {
        let (status, _) = ctx
            .post(
                "/runs/reserve-id",
                json!({ "user": { "email": unique_email("stats") } }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, after) = ctx.get("/runs/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert!(after["totalRuns"].as_i64().unwrap() >= total_before + 3);
    assert!(after["pools"].as_array().unwrap().len() <= 5);
}
