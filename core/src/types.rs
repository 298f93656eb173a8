//! Minimal domain DTOs the session lifecycle needs.
//!
//! # Design
//! Resource types beyond users are left to callers: anything implementing
//! serde's traits can be sent and received through the generic client
//! methods. `Identifiable` is the one contract shared by stored objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An object with a server-side identifier.
pub trait Identifiable {
    fn id(&self) -> Option<&str>;
}

/// A Geocore user as sent to `/register` and returned by `/users/...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocoreUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl GeocoreUser {
    /// The user a device logs in as when it has no account of its own:
    /// id `<project_id>_<device_id>`, password the id reversed.
    pub fn default_user(project_id: &str, device_id: &str) -> Self {
        let (id, password) = Self::default_credentials(project_id, device_id);
        Self {
            name: Some(device_id.to_string()),
            id: Some(id),
            email: None,
            password: Some(password),
        }
    }

    pub fn default_credentials(project_id: &str, device_id: &str) -> (String, String) {
        let id = format!("{project_id}_{device_id}");
        let password = id.chars().rev().collect();
        (id, password)
    }
}

impl Identifiable for GeocoreUser {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// The `result` node of a successful `/auth` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthResult {
    /// Read the token out of a raw `result` node. Anything other than an
    /// object with a string `token` yields no token.
    pub fn from_node(node: &Value) -> Self {
        AuthResult {
            token: node.get("token").and_then(Value::as_str).map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_is_derived_from_project_and_device() {
        let user = GeocoreUser::default_user("PRO-1", "dev42");
        assert_eq!(user.id(), Some("PRO-1_dev42"));
        assert_eq!(user.password.as_deref(), Some("24ved_1-ORP"));
        assert_eq!(user.name.as_deref(), Some("dev42"));
    }

    #[test]
    fn user_serializes_without_empty_fields() {
        let user = GeocoreUser {
            id: Some("u1".to_string()),
            ..GeocoreUser::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, serde_json::json!({"id": "u1"}));
    }

    #[test]
    fn auth_result_tolerates_missing_token() {
        let auth: AuthResult = serde_json::from_str("{}").unwrap();
        assert!(auth.token.is_none());
    }

    #[test]
    fn auth_result_from_node_only_accepts_string_tokens() {
        use serde_json::json;
        assert_eq!(
            AuthResult::from_node(&json!({"token": "t1"})).token.as_deref(),
            Some("t1")
        );
        for node in [json!(null), json!({}), json!({"token": 42}), json!("t1")] {
            assert!(AuthResult::from_node(&node).token.is_none(), "{node}");
        }
    }
}
