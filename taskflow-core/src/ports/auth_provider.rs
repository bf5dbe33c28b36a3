//! Authentication provider port
//!
//! Defines the interface to the external auth service. The session store
//! depends only on this trait; concrete backends (REST, in-memory) live
//! in `adapters`.

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{Session, User};

/// External authentication service
///
/// Auth-state change events (`SIGNED_IN`/`SIGNED_OUT`) are not part of
/// this trait: the host wires the provider's subscription mechanism to
/// `SessionStore::handle_auth_event`, which keeps one source of truth
/// for "user became authenticated".
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Provider name (e.g., "rest", "memory")
    fn name(&self) -> &str;

    /// Read the current session, if any
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Force a token refresh, returning the renewed session if one exists
    async fn refresh_session(&self) -> Result<Option<Session>>;

    /// Register a new user
    ///
    /// The returned user is unconfirmed; authentication happens only
    /// after email confirmation, via the auth-event subscription.
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<User>;

    /// Authenticate with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Invalidate the current session
    async fn sign_out(&self) -> Result<()>;
}
