//! Account (workspace) domain model

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Workspace kind: every user has exactly one personal account and
/// belongs to zero or more team accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Personal,
    Team,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Personal => "personal",
            AccountType::Team => "team",
        }
    }
}

/// A workspace the user can act within
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// URL-safe human identifier, used in `/app/:teamSlug` paths
    pub slug: String,
    pub name: String,
    pub account_type: AccountType,
    /// Free-form workspace info (onboarding progress lives here)
    #[serde(default)]
    pub account_info: HashMap<String, JsonValue>,
    /// Free-form workspace settings
    #[serde(default)]
    pub account_settings: HashMap<String, JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with required fields
    pub fn new(
        id: Uuid,
        slug: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            slug: slug.into(),
            name: name.into(),
            account_type,
            account_info: HashMap::new(),
            account_settings: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_personal(&self) -> bool {
        self.account_type == AccountType::Personal
    }

    pub fn is_team(&self) -> bool {
        self.account_type == AccountType::Team
    }

    /// Onboarding: timestamp recorded when the profile step was completed
    pub fn profile_completed_at(&self) -> Option<&JsonValue> {
        self.account_info.get("profile_completed_at")
    }

    /// Onboarding: timestamp recorded when the preferences step was completed
    pub fn preferences_completed_at(&self) -> Option<&JsonValue> {
        self.account_info.get("preferences_completed_at")
    }

    /// Slugs are lowercase alphanumeric with hyphens, never empty
    pub fn is_valid_slug(slug: &str) -> bool {
        use std::sync::OnceLock;
        static SLUG_RE: OnceLock<regex::Regex> = OnceLock::new();
        let re = SLUG_RE.get_or_init(|| regex::Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());
        re.is_match(slug)
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("account name cannot be empty");
        }
        if !Self::is_valid_slug(&self.slug) {
            return Err("account slug must be lowercase alphanumeric with hyphens");
        }
        Ok(())
    }
}
