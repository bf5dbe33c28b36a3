//! Session and auth-event domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::User;

/// Proof of authentication held by the external auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
}

impl Session {
    /// Whether the access token has passed its expiry time
    ///
    /// Sessions without an expiry are treated as non-expiring; the
    /// periodic validator will still catch a revoked token server-side.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}

/// Auth-state change emitted by the provider subscription
///
/// The session store treats these events as the single source of truth
/// for "user became authenticated" and "user signed out"; the sign-in
/// and sign-out operations themselves only trigger the provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
    UserUpdated(User),
}
