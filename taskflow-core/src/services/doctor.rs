//! Doctor service - live state health checks

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;

use crate::ports::AuthProvider;
use crate::router::Router;
use crate::services::SessionStore;

/// Doctor service for session/state diagnostics
pub struct DoctorService {
    store: Arc<SessionStore>,
    router: Arc<Router>,
    auth: Arc<dyn AuthProvider>,
}

impl DoctorService {
    pub fn new(store: Arc<SessionStore>, router: Arc<Router>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, router, auth }
    }

    /// Run all health checks
    pub async fn run_checks(&self) -> Result<DoctorResult> {
        let mut checks = HashMap::new();
        let state = self.store.state();

        // State consistency
        checks.insert("state_consistency".to_string(), CheckResult {
            status: if state.is_corrupted() { "error" } else { "pass" }.to_string(),
            message: if state.is_corrupted() {
                "State is internally inconsistent (auth flags disagree with loaded data)".to_string()
            } else {
                "Auth flags and loaded data agree".to_string()
            },
            details: if state.is_corrupted() {
                Some(vec![json!({
                    "is_authenticated": state.is_authenticated,
                    "has_user": state.user.is_some(),
                    "account_count": state.accounts.len(),
                })])
            } else {
                None
            },
        });

        // Active account must be one of the accessible accounts
        let membership_ok = match &state.current_account {
            Some(current) => state.accounts.iter().any(|a| a.id == current.id),
            None => true,
        };
        checks.insert("current_account_membership".to_string(), CheckResult {
            status: if membership_ok { "pass" } else { "error" }.to_string(),
            message: if membership_ok {
                match &state.current_account {
                    Some(current) => format!("Active workspace '{}' is accessible", current.slug),
                    None => "No workspace selected yet".to_string(),
                }
            } else {
                "Active workspace is not in the accessible accounts list".to_string()
            },
            details: None,
        });

        // Exactly one personal account once data has loaded
        let personal_count = state.accounts.iter().filter(|a| a.is_personal()).count();
        let personal_status = if state.accounts.is_empty() {
            "pass"
        } else if personal_count == 1 {
            "pass"
        } else {
            "error"
        };
        checks.insert("personal_account".to_string(), CheckResult {
            status: personal_status.to_string(),
            message: if state.accounts.is_empty() {
                "Accounts not loaded yet".to_string()
            } else if personal_count == 1 {
                "Exactly one personal workspace present".to_string()
            } else {
                format!("Expected exactly one personal workspace, found {}", personal_count)
            },
            details: None,
        });

        // Route slug vs active account
        let route_slug = self.router.context().params.get("teamSlug").cloned();
        let aligned = match (&route_slug, &state.current_account) {
            (Some(slug), Some(current)) => &current.slug == slug,
            (Some(_), None) => false,
            (None, _) => true,
        };
        checks.insert("route_account_alignment".to_string(), CheckResult {
            status: if aligned { "pass" } else { "warning" }.to_string(),
            message: if aligned {
                "Route and active workspace agree".to_string()
            } else {
                format!(
                    "Route expects workspace '{}' but '{}' is active",
                    route_slug.as_deref().unwrap_or("?"),
                    state
                        .current_account
                        .as_ref()
                        .map(|a| a.slug.as_str())
                        .unwrap_or("none")
                )
            },
            details: None,
        });

        // Local auth flag vs upstream session
        let session = self.auth.get_session().await.ok().flatten();
        let (session_status, session_message) = match (&session, state.is_authenticated) {
            (None, true) => (
                "error",
                "Local state is authenticated but the service has no session".to_string(),
            ),
            (Some(s), true) => {
                let soon = Utc::now() + Duration::minutes(5);
                if s.is_expired(soon) {
                    ("warning", "Session expires within 5 minutes".to_string())
                } else {
                    ("pass", "Session is valid".to_string())
                }
            }
            (Some(_), false) => (
                "warning",
                "Service has a session but local state is signed out".to_string(),
            ),
            (None, false) => ("pass", "Signed out, no session".to_string()),
        };
        checks.insert("session".to_string(), CheckResult {
            status: session_status.to_string(),
            message: session_message,
            details: None,
        });

        let passed = checks.values().filter(|c| c.status == "pass").count() as i64;
        let warnings = checks.values().filter(|c| c.status == "warning").count() as i64;
        let errors = checks.values().filter(|c| c.status == "error").count() as i64;

        Ok(DoctorResult {
            checks,
            summary: DoctorSummary { passed, warnings, errors },
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorResult {
    pub checks: HashMap<String, CheckResult>,
    pub summary: DoctorSummary,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub struct DoctorSummary {
    pub passed: i64,
    pub warnings: i64,
    pub errors: i64,
}
