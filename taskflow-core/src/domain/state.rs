//! Application state shared between the session store and its readers

use serde::{Deserialize, Serialize};

use crate::domain::{Account, User};

/// Process-wide application state
///
/// The session store is the sole writer; readers receive snapshots
/// through a watch channel and must treat them as read-only. Every
/// update replaces the whole object (copy-on-write), so a snapshot
/// never mutates under a reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub user: Option<User>,
    pub current_account: Option<Account>,
    pub accounts: Vec<Account>,
    pub loading: bool,
    pub error: Option<String>,
    pub is_authenticated: bool,
}

impl AppState {
    /// State at process startup, before the first session check resolves
    pub fn initial() -> Self {
        Self {
            user: None,
            current_account: None,
            accounts: Vec::new(),
            loading: true,
            error: None,
            is_authenticated: false,
        }
    }

    /// Fully signed-out state (after a sign-out or failed recovery)
    pub fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::initial()
        }
    }

    /// Detect an internally inconsistent state
    ///
    /// Flagged as authenticated but missing the user, or holding a user
    /// with an empty accounts list while claiming authenticated: both
    /// signal a torn update rather than a legitimate state, and are
    /// resolved by full recovery rather than surfaced as a user error.
    pub fn is_corrupted(&self) -> bool {
        if !self.is_authenticated {
            return false;
        }
        match &self.user {
            None => true,
            Some(_) => self.accounts.is_empty(),
        }
    }

    /// Whether the user and accounts list have both loaded
    pub fn has_critical_data(&self) -> bool {
        self.user.is_some() && !self.accounts.is_empty()
    }

    /// The personal account in the loaded accounts list, if present
    pub fn personal_account(&self) -> Option<&Account> {
        self.accounts.iter().find(|a| a.is_personal())
    }

    /// Apply a partial update, consuming the previous state
    pub fn merged(mut self, patch: StatePatch) -> Self {
        if let Some(user) = patch.user {
            self.user = user;
        }
        if let Some(current_account) = patch.current_account {
            self.current_account = current_account;
        }
        if let Some(accounts) = patch.accounts {
            self.accounts = accounts;
        }
        if let Some(loading) = patch.loading {
            self.loading = loading;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
        if let Some(is_authenticated) = patch.is_authenticated {
            self.is_authenticated = is_authenticated;
        }
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Partial update merged by the store's single internal setter
///
/// `None` leaves a field untouched; `Some(inner)` overwrites it,
/// including `Some(None)` for clearing optional fields.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub user: Option<Option<User>>,
    pub current_account: Option<Option<Account>>,
    pub accounts: Option<Vec<Account>>,
    pub loading: Option<bool>,
    pub error: Option<Option<String>>,
    pub is_authenticated: Option<bool>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: Option<User>) -> Self {
        self.user = Some(user);
        self
    }

    pub fn current_account(mut self, account: Option<Account>) -> Self {
        self.current_account = Some(account);
        self
    }

    pub fn accounts(mut self, accounts: Vec<Account>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_authenticated(mut self, value: bool) -> Self {
        self.is_authenticated = Some(value);
        self
    }
}
