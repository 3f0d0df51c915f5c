// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request-body templating for catalog launches.
//!
//! Catalog items carry a JSON request-body template with `{{form.key}}`
//! placeholders that are filled from the launch parameters. Substitution is
//! recursive through objects and arrays. A string that consists of exactly
//! one placeholder takes the parameter's JSON value directly, so numbers,
//! booleans, and arrays keep their types; placeholders embedded in longer
//! strings interpolate textually. Unknown placeholders are left as-is.

use serde_json::{Map, Value};

/// Render a JSON template against launch parameters.
pub fn render_template(template: &Value, parameters: &Map<String, Value>) -> Value {
    match template {
        Value::String(text) => render_string(text, parameters),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_template(item, parameters))
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), render_template(value, parameters)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn placeholder(key: &str) -> String {
    format!("{{{{form.{}}}}}", key)
}

fn render_string(text: &str, parameters: &Map<String, Value>) -> Value {
    // Exact-token case: take the parameter value with its type intact.
    for (key, value) in parameters {
        if text == placeholder(key) {
            return value.clone();
        }
    }

    let mut rendered = text.to_string();
    for (key, value) in parameters {
        let token = placeholder(key);
        if !rendered.contains(&token) {
            continue;
        }
        let replacement = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        rendered = rendered.replace(&token, &replacement);
    }

    Value::String(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_string_interpolation() {
        let template = json!({ "limit": "host-{{form.target}}" });
        let parameters = params(json!({ "target": "web01" }));

        let rendered = render_template(&template, &parameters);
        assert_eq!(rendered, json!({ "limit": "host-web01" }));
    }

    #[test]
    fn test_exact_token_keeps_value_type() {
        let template = json!({
            "inventory": "{{form.inventory_id}}",
            "verbose": "{{form.verbose}}",
            "hosts": "{{form.hosts}}"
        });
        let parameters = params(json!({
            "inventory_id": 7,
            "verbose": true,
            "hosts": ["web01", "web02"]
        }));

        let rendered = render_template(&template, &parameters);
        assert_eq!(
            rendered,
            json!({ "inventory": 7, "verbose": true, "hosts": ["web01", "web02"] })
        );
    }

    #[test]
    fn test_recursive_substitution() {
        let template = json!({
            "extra_vars": {
                "targets": ["{{form.target}}", "bastion"],
                "note": "run for {{form.target}}"
            }
        });
        let parameters = params(json!({ "target": "db01" }));

        let rendered = render_template(&template, &parameters);
        assert_eq!(
            rendered,
            json!({
                "extra_vars": {
                    "targets": ["db01", "bastion"],
                    "note": "run for db01"
                }
            })
        );
    }

    #[test]
    fn test_number_interpolated_into_longer_string() {
        let template = json!({ "note": "timeout={{form.timeout}}s" });
        let parameters = params(json!({ "timeout": 30 }));

        let rendered = render_template(&template, &parameters);
        assert_eq!(rendered, json!({ "note": "timeout=30s" }));
    }

    #[test]
    fn test_unknown_placeholder_left_intact() {
        let template = json!({ "limit": "{{form.missing}}" });
        let parameters = params(json!({ "target": "web01" }));

        let rendered = render_template(&template, &parameters);
        assert_eq!(rendered, json!({ "limit": "{{form.missing}}" }));
    }

    #[test]
    fn test_non_string_leaves_pass_through() {
        let template = json!({ "inventory": 3, "diff_mode": false, "tags": null });
        let parameters = params(json!({ "target": "web01" }));

        let rendered = render_template(&template, &parameters);
        assert_eq!(rendered, template);
    }
}
