// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP request handlers.
//!
//! One module per resource; all handlers take [`crate::state::AppState`] and
//! return `Result<_, ApiError>`. Wire types use camelCase field names.

use serde::Deserialize;

use runway_core::CallerIdentity;

/// Activity log handlers.
pub mod activity;

/// Catalog item and execution handlers (including the launch flow).
pub mod catalog;

/// Group directory handlers.
pub mod groups;

/// Health check handler.
pub mod health;

/// Namespace handlers.
pub mod namespaces;

/// Run listing, run-ID preview/reserve, and counter statistics handlers.
pub mod runs;

/// Schedule handlers.
pub mod schedules;

/// Settings handlers.
pub mod settings;

/// User directory handlers.
pub mod users;

/// Caller user reference accepted in request bodies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRef {
    /// Opaque user ID.
    pub id: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
}

impl UserRef {
    /// The identity used for pool selection.
    pub fn identity(&self) -> CallerIdentity {
        CallerIdentity {
            id: self.id.clone(),
            email: self.email.clone(),
        }
    }

    /// Who to record as the acting user: name, then email, then "system".
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.email.clone().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "system".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback_chain() {
        let user = UserRef {
            id: None,
            email: Some("ops@example.com".to_string()),
            name: Some("Ops Admin".to_string()),
        };
        assert_eq!(user.display_name(), "Ops Admin");

        let user = UserRef {
            id: Some("u-1".to_string()),
            email: Some("ops@example.com".to_string()),
            name: None,
        };
        assert_eq!(user.display_name(), "ops@example.com");

        assert_eq!(UserRef::default().display_name(), "system");
    }
}
