//! User domain model

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// An authenticated user as reported by the auth provider
///
/// The core only depends on identity, timestamps and the free-form
/// metadata map; everything else the provider returns is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    /// Set once the user has confirmed their email address
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl User {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            created_at: Utc::now(),
            confirmed_at: None,
            metadata: HashMap::new(),
        }
    }

    /// Whether the user has completed email confirmation
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Read a boolean flag from the metadata map
    ///
    /// Accepts both real booleans and the string forms some providers store.
    pub fn metadata_flag(&self, key: &str) -> bool {
        match self.metadata.get(key) {
            Some(JsonValue::Bool(b)) => *b,
            Some(JsonValue::String(s)) => s == "true",
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_creation() {
        let user = User::new(Uuid::new_v4(), "test@example.com");
        assert_eq!(user.email, "test@example.com");
        assert!(!user.is_confirmed());
    }

    #[test]
    fn test_metadata_flag() {
        let mut user = User::new(Uuid::new_v4(), "test@example.com");
        assert!(!user.metadata_flag("onboarding_completed"));

        user.metadata
            .insert("onboarding_completed".to_string(), json!(true));
        assert!(user.metadata_flag("onboarding_completed"));

        user.metadata
            .insert("onboarding_completed".to_string(), json!("true"));
        assert!(user.metadata_flag("onboarding_completed"));

        user.metadata
            .insert("onboarding_completed".to_string(), json!(1));
        assert!(!user.metadata_flag("onboarding_completed"));
    }
}
