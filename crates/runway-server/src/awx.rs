// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! AWX (Ansible Tower) API client.
//!
//! Launches job templates against the configured AWX instance. Connection
//! settings resolve from the settings table first (`default_api_endpoint`,
//! `awx_token`), then from the `AWX_BASE_URL` / `AWX_TOKEN` environment
//! variables. With no usable configuration the catalog launch flow runs in
//! demo mode and records a simulated job instead of calling out.

use rand::Rng;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Settings key holding the AWX API base URL.
pub const SETTING_AWX_BASE_URL: &str = "default_api_endpoint";

/// Settings key holding the AWX API token.
pub const SETTING_AWX_TOKEN: &str = "awx_token";

/// Resolved AWX connection configuration.
#[derive(Debug, Clone, Default)]
pub struct AwxConfig {
    /// Base URL of the AWX API (ends with `/api/v2`).
    pub base_url: String,
    /// Bearer token for the AWX API.
    pub token: String,
}

impl AwxConfig {
    /// Resolve configuration: settings table first, env fallback.
    pub async fn resolve(pool: &PgPool) -> Self {
        let mut base_url = String::new();
        let mut token = String::new();

        match crate::db::get_setting(pool, SETTING_AWX_BASE_URL).await {
            Ok(Some(value)) => base_url = value,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to read AWX base URL setting"),
        }
        match crate::db::get_setting(pool, SETTING_AWX_TOKEN).await {
            Ok(Some(value)) => token = value,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to read AWX token setting"),
        }

        if base_url.is_empty() {
            base_url = std::env::var("AWX_BASE_URL").unwrap_or_default();
        }
        if token.is_empty() {
            token = std::env::var("AWX_TOKEN").unwrap_or_default();
        }

        Self { base_url, token }
    }

    /// Whether the configuration points at a real AWX instance.
    ///
    /// Placeholder URLs (the shipped `example.com` default) count as
    /// unconfigured so fresh installs get demo mode instead of timeouts.
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty()
            && !self.base_url.is_empty()
            && !self.base_url.contains("example.com")
    }
}

/// Job information returned by an AWX launch.
#[derive(Debug, Clone, Deserialize)]
pub struct AwxJob {
    /// Job ID.
    pub id: Option<i64>,
    /// Job ID under the legacy `job` key (workflow launches).
    pub job: Option<i64>,
    /// Job status as reported by AWX.
    pub status: Option<String>,
    /// API URL of the job.
    pub url: Option<String>,
}

impl AwxJob {
    /// The job ID, whichever key AWX put it under.
    pub fn job_id(&self) -> Option<i64> {
        self.id.or(self.job)
    }
}

/// Build a simulated job for demo mode (AWX not configured).
pub fn demo_job() -> AwxJob {
    let id = rand::thread_rng().gen_range(1000..11000);
    AwxJob {
        id: Some(id),
        job: None,
        status: Some("successful".to_string()),
        url: Some(format!("/api/v2/jobs/{}/", id)),
    }
}

/// AWX API client.
#[derive(Clone)]
pub struct AwxClient {
    http: reqwest::Client,
    config: AwxConfig,
}

impl AwxClient {
    /// Create a client from resolved configuration.
    pub fn new(http: reqwest::Client, config: AwxConfig) -> Self {
        Self { http, config }
    }

    /// Launch a job template with the given request body.
    pub async fn launch_job_template(
        &self,
        template_id: &str,
        body: &serde_json::Value,
    ) -> Result<AwxJob, ApiError> {
        let url = format!(
            "{}/job_templates/{}/launch/",
            self.config.base_url.trim_end_matches('/'),
            template_id
        );

        debug!(%url, template_id, "launching AWX job template");

        let mut request = self.http.post(&url).json(body);
        if !self.config.token.is_empty() {
            request = request.bearer_auth(&self.config.token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Awx(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApiError::Awx(format!(
                "AWX API error: {} {}",
                status, detail
            )));
        }

        response
            .json::<AwxJob>()
            .await
            .map_err(|e| ApiError::Awx(format!("invalid AWX response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server_url: &str) -> AwxClient {
        AwxClient::new(
            reqwest::Client::new(),
            AwxConfig {
                base_url: format!("{}/api/v2", server_url),
                token: "secret-token".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_launch_posts_body_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/42/launch/"))
            .and(bearer_token("secret-token"))
            .and(body_json(json!({ "extra_vars": { "target": "web01" } })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 777,
                "status": "pending",
                "url": "/api/v2/jobs/777/"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let job = client_for(&server.uri())
            .launch_job_template("42", &json!({ "extra_vars": { "target": "web01" } }))
            .await
            .unwrap();

        assert_eq!(job.job_id(), Some(777));
        assert_eq!(job.status.as_deref(), Some("pending"));
    }

    #[tokio::test]
    async fn test_launch_reads_workflow_job_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/9/launch/"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "job": 555 })),
            )
            .mount(&server)
            .await;

        let job = client_for(&server.uri())
            .launch_job_template("9", &json!({}))
            .await
            .unwrap();

        assert_eq!(job.job_id(), Some(555));
    }

    #[tokio::test]
    async fn test_launch_surfaces_awx_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/13/launch/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("variables not allowed"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server.uri())
            .launch_job_template("13", &json!({}))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("400"));
        assert!(message.contains("variables not allowed"));
    }

    #[test]
    fn test_placeholder_url_counts_as_unconfigured() {
        let config = AwxConfig {
            base_url: "https://awx.example.com/api/v2".to_string(),
            token: "token".to_string(),
        };
        assert!(!config.is_configured());

        let config = AwxConfig {
            base_url: "https://awx.internal/api/v2".to_string(),
            token: String::new(),
        };
        assert!(!config.is_configured());

        let config = AwxConfig {
            base_url: "https://awx.internal/api/v2".to_string(),
            token: "token".to_string(),
        };
        assert!(config.is_configured());
    }

    #[test]
    fn test_demo_job_looks_successful() {
        let job = demo_job();
        assert!(job.job_id().is_some());
        assert_eq!(job.status.as_deref(), Some("successful"));
    }
}
