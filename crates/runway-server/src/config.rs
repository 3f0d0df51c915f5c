// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;

/// Runway server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// Maximum database pool connections
    pub max_db_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `RUNWAY_DATABASE_URL`: PostgreSQL connection string
    ///
    /// Optional (with defaults):
    /// - `RUNWAY_HTTP_PORT`: HTTP server port (default: 8080)
    /// - `RUNWAY_MAX_DB_CONNECTIONS`: Pool size (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("RUNWAY_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("RUNWAY_DATABASE_URL"))?;

        let http_port: u16 = std::env::var("RUNWAY_HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("RUNWAY_HTTP_PORT", "must be a valid port number")
            })?;

        let max_db_connections: u32 = std::env::var("RUNWAY_MAX_DB_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("RUNWAY_MAX_DB_CONNECTIONS", "must be a positive integer")
            })?;

        Ok(Self {
            database_url,
            http_addr: SocketAddr::from(([0, 0, 0, 0], http_port)),
            max_db_connections,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
