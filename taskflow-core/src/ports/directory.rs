//! Workspace directory port
//!
//! Defines the interface for account/workspace queries against the
//! external data service.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::Account;

/// Account/workspace CRUD queries
#[async_trait]
pub trait WorkspaceDirectory: Send + Sync {
    /// List every account the user can act within (personal + teams)
    async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<Account>>;

    /// Fetch the user's personal workspace
    async fn get_personal_workspace(&self, user_id: Uuid) -> Result<Account>;

    /// Fetch full detail for a team workspace by slug
    async fn get_team_workspace(&self, slug: &str) -> Result<Account>;

    /// Persist account changes (settings, onboarding progress)
    async fn update_account(&self, account: &Account) -> Result<Account>;
}
