//! In-memory backend for demo mode and testing
//!
//! Implements both the auth provider and workspace directory ports
//! against process-local state. Integration tests mock network IO at
//! the trait level by driving this adapter's hooks (confirm an email,
//! drop a session, age an account) instead of a real service.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountType, Session, User};
use crate::ports::{AuthProvider, WorkspaceDirectory};

const SESSION_TTL_MINUTES: i64 = 60;

struct MemoryInner {
    /// Registered users keyed by email
    users: HashMap<String, RegisteredUser>,
    /// All accounts keyed by id
    accounts: HashMap<Uuid, Account>,
    /// Account ids each user can act within
    memberships: HashMap<Uuid, Vec<Uuid>>,
    /// The current session, if signed in
    session: Option<Session>,
}

struct RegisteredUser {
    user: User,
    password: String,
}

pub struct MemoryBackend {
    inner: Mutex<MemoryInner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                users: HashMap::new(),
                accounts: HashMap::new(),
                memberships: HashMap::new(),
                session: None,
            }),
        }
    }

    /// Backend pre-seeded with a confirmed demo user
    ///
    /// Credentials: `demo@taskflow.app` / `taskflow-demo`. The user owns
    /// a personal workspace and belongs to one team, so demo mode skips
    /// the onboarding gate.
    pub fn with_demo_user() -> Self {
        let backend = Self::new();
        {
            let mut inner = backend.inner.lock().unwrap();
            let mut user = User::new(Uuid::new_v4(), "demo@taskflow.app");
            user.created_at = Utc::now() - Duration::days(30);
            user.confirmed_at = Some(user.created_at);
            let user_id = user.id;

            let personal = Account::new(Uuid::new_v4(), "demo", "Demo User", AccountType::Personal);
            let team = Account::new(Uuid::new_v4(), "acme", "Acme Corp", AccountType::Team);
            inner
                .memberships
                .insert(user_id, vec![personal.id, team.id]);
            inner.accounts.insert(personal.id, personal);
            inner.accounts.insert(team.id, team);
            inner.users.insert(
                "demo@taskflow.app".to_string(),
                RegisteredUser {
                    user,
                    password: "taskflow-demo".to_string(),
                },
            );
        }
        backend
    }

    fn make_session(user: User) -> Session {
        Session {
            access_token: random_token(),
            refresh_token: Some(random_token()),
            expires_at: Some(Utc::now() + Duration::minutes(SESSION_TTL_MINUTES)),
            user,
        }
    }

    // ------------------------------------------------------------------
    // Test/demo hooks - not part of the port contracts
    // ------------------------------------------------------------------

    /// Mark a registered user's email as confirmed
    pub fn confirm_email(&self, email: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let registered = inner
            .users
            .get_mut(email)
            .ok_or_else(|| Error::not_found(format!("no user registered as {}", email)))?;
        registered.user.confirmed_at = Some(Utc::now());
        Ok(())
    }

    /// Backdate a user's creation timestamp (onboarding recency tests)
    pub fn age_user(&self, email: &str, age: Duration) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let registered = inner
            .users
            .get_mut(email)
            .ok_or_else(|| Error::not_found(format!("no user registered as {}", email)))?;
        registered.user.created_at = Utc::now() - age;
        if let Some(session) = inner.session.as_mut() {
            session.user.created_at = Utc::now() - age;
        }
        Ok(())
    }

    /// Create a team and add the user to it
    pub fn add_team(&self, user_id: Uuid, slug: &str, name: &str) -> Result<Account> {
        let account = Account::new(Uuid::new_v4(), slug, name, AccountType::Team);
        account.validate().map_err(Error::validation)?;
        let mut inner = self.inner.lock().unwrap();
        if inner.accounts.values().any(|a| a.slug == slug) {
            return Err(Error::validation(format!("slug '{}' is taken", slug)));
        }
        inner.accounts.insert(account.id, account.clone());
        inner.memberships.entry(user_id).or_default().push(account.id);
        Ok(account)
    }

    /// Drop the current session without a sign-out call (simulates
    /// server-side expiry or revocation)
    pub fn drop_session(&self) {
        self.inner.lock().unwrap().session = None;
    }

    /// Rotate the current session's tokens in place (simulates a
    /// background token refresh by another tab)
    pub fn rotate_tokens(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(session) = inner.session.as_mut() {
            session.access_token = random_token();
            session.refresh_token = Some(random_token());
            session.expires_at = Some(Utc::now() + Duration::minutes(SESSION_TTL_MINUTES));
        }
    }

    /// Record an onboarding completion timestamp on an account
    pub fn set_account_info(
        &self,
        account_id: Uuid,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| Error::not_found("no such account"))?;
        account.account_info.insert(key.to_string(), value);
        account.updated_at = Utc::now();
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn slug_from_email(email: &str, taken: impl Fn(&str) -> bool) -> String {
    let local = email.split('@').next().unwrap_or("user");
    let base: String = local
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let base = base.trim_matches('-').to_string();
    let base = if base.is_empty() { "user".to_string() } else { base };

    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn fresh_session(session: &Session, now: DateTime<Utc>) -> Option<Session> {
    if session.is_expired(now) {
        None
    } else {
        Some(session.clone())
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .session
            .as_ref()
            .and_then(|s| fresh_session(s, Utc::now())))
    }

    async fn refresh_session(&self) -> Result<Option<Session>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.session.as_mut() {
            Some(session) if session.refresh_token.is_some() => {
                session.access_token = random_token();
                session.refresh_token = Some(random_token());
                session.expires_at = Some(Utc::now() + Duration::minutes(SESSION_TTL_MINUTES));
                Ok(Some(session.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<User> {
        if !email.contains('@') {
            return Err(Error::validation("invalid email address"));
        }
        if password.len() < 8 {
            return Err(Error::validation("password must be at least 8 characters"));
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.users.contains_key(email) {
            return Err(Error::validation("an account with this email already exists"));
        }

        let mut user = User::new(Uuid::new_v4(), email);
        user.metadata.insert(
            "full_name".to_string(),
            serde_json::Value::String(name.to_string()),
        );

        // Every user gets a personal workspace at registration
        let slug = slug_from_email(email, |candidate| {
            inner.accounts.values().any(|a| a.slug == candidate)
        });
        let display_name = if name.trim().is_empty() { email } else { name };
        let personal = Account::new(Uuid::new_v4(), slug, display_name, AccountType::Personal);
        inner.memberships.insert(user.id, vec![personal.id]);
        inner.accounts.insert(personal.id, personal);

        inner.users.insert(
            email.to_string(),
            RegisteredUser {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut inner = self.inner.lock().unwrap();
        let registered = inner
            .users
            .get(email)
            .ok_or_else(|| Error::auth("invalid login credentials"))?;
        if registered.password != password {
            return Err(Error::auth("invalid login credentials"));
        }
        if !registered.user.is_confirmed() {
            return Err(Error::auth("email not confirmed"));
        }

        let session = Self::make_session(registered.user.clone());
        inner.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.inner.lock().unwrap().session = None;
        Ok(())
    }
}

#[async_trait]
impl WorkspaceDirectory for MemoryBackend {
    async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<Account>> {
        let inner = self.inner.lock().unwrap();
        let ids = inner.memberships.get(&user_id).cloned().unwrap_or_default();
        let mut accounts: Vec<Account> = ids
            .iter()
            .filter_map(|id| inner.accounts.get(id).cloned())
            .collect();
        // Personal first, then teams by creation time
        accounts.sort_by_key(|a| (a.is_team(), a.created_at));
        Ok(accounts)
    }

    async fn get_personal_workspace(&self, user_id: Uuid) -> Result<Account> {
        let accounts = self.list_accounts(user_id).await?;
        accounts
            .into_iter()
            .find(|a| a.is_personal())
            .ok_or_else(|| Error::not_found("no personal workspace for user"))
    }

    async fn get_team_workspace(&self, slug: &str) -> Result<Account> {
        let inner = self.inner.lock().unwrap();
        inner
            .accounts
            .values()
            .find(|a| a.is_team() && a.slug == slug)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("no team workspace '{}'", slug)))
    }

    async fn update_account(&self, account: &Account) -> Result<Account> {
        account.validate().map_err(Error::validation)?;
        let mut inner = self.inner.lock().unwrap();
        let existing = inner
            .accounts
            .get_mut(&account.id)
            .ok_or_else(|| Error::not_found("no such account"))?;
        let mut updated = account.clone();
        updated.updated_at = Utc::now();
        *existing = updated.clone();
        Ok(updated)
    }
}
