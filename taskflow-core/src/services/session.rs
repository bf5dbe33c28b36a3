//! Session store - owns `AppState` and mediates every state transition
//!
//! The store is the sole writer of application state. Every mutation
//! goes through one internal setter that merges a partial update and
//! broadcasts the replaced state on a watch channel. Operations return
//! `OperationResult` and never panic past their own boundary; failures
//! surface as a message in `AppState.error` with an escalating recovery
//! ladder (`validate_session` -> `recover_session` -> `force_full_recovery`)
//! behind them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::domain::result::OperationResult;
use crate::domain::{Account, AppState, AuthEvent, Session, StatePatch, User};
use crate::ports::{AuthProvider, WorkspaceDirectory};
use crate::router::Router;
use crate::services::onboarding;

pub struct SessionStore {
    auth: Arc<dyn AuthProvider>,
    directory: Arc<dyn WorkspaceDirectory>,
    router: Arc<Router>,
    tx: watch::Sender<AppState>,
    /// Load generation: a completed data load applies its results only
    /// if no reset/switch/newer load happened since it started
    generation: AtomicU64,
    /// Ad hoc guard against concurrent account switches
    switch_in_progress: AtomicBool,
    /// Honored by the background monitor; set during full recovery
    monitoring_paused: AtomicBool,
}

/// Clears the switch flag when the switch operation exits on any path
struct SwitchGuard<'a>(&'a AtomicBool);

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SessionStore {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        directory: Arc<dyn WorkspaceDirectory>,
        router: Arc<Router>,
    ) -> Self {
        let (tx, _) = watch::channel(AppState::initial());
        Self {
            auth,
            directory,
            router,
            tx,
            generation: AtomicU64::new(0),
            switch_in_progress: AtomicBool::new(false),
            monitoring_paused: AtomicBool::new(false),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> AppState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    /// The single internal setter: merge a partial update and notify
    fn apply(&self, patch: StatePatch) {
        let next = self.tx.borrow().clone().merged(patch);
        self.tx.send_replace(next);
    }

    /// Replace the whole state (resets and recovery)
    fn replace(&self, state: AppState) {
        self.tx.send_replace(state);
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_monitoring_paused(&self) -> bool {
        self.monitoring_paused.load(Ordering::SeqCst)
    }

    /// Whether an account switch is currently in flight
    pub fn is_switching(&self) -> bool {
        self.switch_in_progress.load(Ordering::SeqCst)
    }

    /// Detect an internally inconsistent state
    pub fn is_state_corrupted(&self) -> bool {
        self.tx.borrow().is_corrupted()
    }

    /// Clear the user-visible error
    pub fn clear_error(&self) {
        self.apply(StatePatch::new().error(None));
    }

    // ------------------------------------------------------------------
    // Auth flows
    // ------------------------------------------------------------------

    /// Register a new user
    ///
    /// Success does not authenticate - email confirmation is pending -
    /// so the store redirects to the confirmation view instead of
    /// touching the auth flags.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> OperationResult<User> {
        match self.auth.sign_up(email, password, name).await {
            Ok(user) => {
                self.apply(StatePatch::new().error(None));
                self.router.go_to_confirm_email(email);
                OperationResult::ok(user)
            }
            Err(e) => {
                let message = e.to_string();
                self.apply(StatePatch::new().error(Some(message.clone())));
                OperationResult::fail(message)
            }
        }
    }

    /// Authenticate with email and password
    ///
    /// Deliberately does not flip `is_authenticated` itself: the final
    /// transition happens through `handle_auth_event(SignedIn)`, keeping
    /// one source of truth for "user became authenticated".
    pub async fn sign_in(&self, email: &str, password: &str) -> OperationResult<Session> {
        self.apply(StatePatch::new().loading(true).error(None));
        match self.auth.sign_in(email, password).await {
            Ok(session) => OperationResult::ok(session),
            Err(e) => {
                let message = e.to_string();
                self.apply(StatePatch::new().loading(false).error(Some(message.clone())));
                OperationResult::fail(message)
            }
        }
    }

    /// Invalidate the session
    ///
    /// Local state resets when the `SignedOut` event arrives, not here.
    pub async fn sign_out(&self) -> OperationResult<()> {
        match self.auth.sign_out().await {
            Ok(()) => OperationResult::ok(()),
            Err(e) => {
                let message = e.to_string();
                self.apply(StatePatch::new().error(Some(message.clone())));
                OperationResult::fail(message)
            }
        }
    }

    /// Apply an auth-state change from the provider subscription
    pub async fn handle_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => {
                self.apply(
                    StatePatch::new()
                        .user(Some(session.user))
                        .is_authenticated(true)
                        .error(None),
                );
                let _ = self.load_user_data().await;
                let _ = self.check_and_redirect_to_onboarding().await;
            }
            AuthEvent::SignedOut => {
                self.bump_generation();
                self.replace(AppState::signed_out());
            }
            AuthEvent::TokenRefreshed(session) => {
                // Only the token changed; patch the user object without
                // reloading data
                self.apply(StatePatch::new().user(Some(session.user)));
            }
            AuthEvent::UserUpdated(user) => {
                self.apply(StatePatch::new().user(Some(user)));
            }
        }
    }

    // ------------------------------------------------------------------
    // Data loading and account switching
    // ------------------------------------------------------------------

    /// Fetch the accounts list and personal workspace in parallel and
    /// merge the results
    ///
    /// Skips the loading flag when user and accounts are already cached,
    /// so background revalidation doesn't flicker the UI. Results from a
    /// load that was superseded mid-flight (sign-out, switch, newer
    /// load) are dropped.
    pub async fn load_user_data(&self) -> OperationResult<()> {
        let state = self.state();
        let user = match state.user {
            Some(ref user) => user.clone(),
            None => return OperationResult::fail("No authenticated user to load data for"),
        };

        let has_cache = state.has_critical_data();
        if !has_cache {
            self.apply(StatePatch::new().loading(true));
        }

        let generation = self.bump_generation();

        let (accounts_result, personal_result) = tokio::join!(
            self.directory.list_accounts(user.id),
            self.directory.get_personal_workspace(user.id),
        );

        let (accounts, personal) = match (accounts_result, personal_result) {
            (Ok(accounts), Ok(personal)) => (accounts, personal),
            (Err(e), _) | (_, Err(e)) => {
                if self.current_generation() == generation {
                    self.apply(
                        StatePatch::new()
                            .loading(false)
                            .error(Some(e.to_string())),
                    );
                }
                return OperationResult::fail(e.to_string());
            }
        };

        if self.current_generation() != generation {
            // A newer operation owns the state now; this result is stale
            return OperationResult::ok(());
        }

        // Keep the selected account if it still exists, else fall back
        // to the personal workspace
        let current = state
            .current_account
            .filter(|c| accounts.iter().any(|a| a.id == c.id))
            .or(Some(personal));

        self.apply(
            StatePatch::new()
                .accounts(accounts)
                .current_account(current)
                .loading(false)
                .is_authenticated(true)
                .error(None),
        );
        OperationResult::ok(())
    }

    /// Switch the active account by slug, id, or the literal `personal`
    ///
    /// Fails with a descriptive error when the identifier is not among
    /// the user's accessible accounts; it never silently picks another
    /// account.
    pub async fn switch_to_account(&self, identifier: &str) -> OperationResult<Account> {
        if self.switch_in_progress.swap(true, Ordering::SeqCst) {
            return OperationResult::fail("An account switch is already in progress");
        }
        let _guard = SwitchGuard(&self.switch_in_progress);

        let state = self.state();

        let target = if identifier == "personal" {
            match state.personal_account() {
                Some(account) => account.clone(),
                None => {
                    let message = "No personal workspace found for this user".to_string();
                    self.apply(StatePatch::new().error(Some(message.clone())));
                    return OperationResult::fail(message);
                }
            }
        } else {
            let found = state
                .accounts
                .iter()
                .find(|a| a.slug == identifier || a.id.to_string() == identifier)
                .cloned();
            match found {
                Some(account) => account,
                None => {
                    let message = format!(
                        "You don't have access to a workspace named '{}'",
                        identifier
                    );
                    self.apply(StatePatch::new().error(Some(message.clone())));
                    return OperationResult::fail(message);
                }
            }
        };

        // Team workspaces carry settings the list endpoint omits; fetch
        // the full detail before activating
        let resolved = if target.is_team() {
            match self.directory.get_team_workspace(&target.slug).await {
                Ok(account) => account,
                Err(e) => {
                    let message = e.to_string();
                    self.apply(StatePatch::new().error(Some(message.clone())));
                    return OperationResult::fail(message);
                }
            }
        } else {
            target
        };

        self.bump_generation();
        self.apply(
            StatePatch::new()
                .current_account(Some(resolved.clone()))
                .error(None),
        );
        OperationResult::ok(resolved)
    }

    /// Ensure the active account matches the router's team-slug param
    ///
    /// Idempotent: when the active account already satisfies the route,
    /// no switch happens. Returns `false` (with the error state set)
    /// when the requested slug has no matching account - a user-facing
    /// "access denied / not found" signal, not a crash.
    pub async fn ensure_correct_account_for_route(
        &self,
        team_slug: Option<&str>,
    ) -> OperationResult<bool> {
        if self.is_switching() {
            // A switch is in flight; the route check reruns on the next
            // render with settled state
            return OperationResult::ok(true);
        }

        let mut state = self.state();
        if state.accounts.is_empty() && state.is_authenticated {
            let loaded = self.load_user_data().await;
            if !loaded.success {
                return OperationResult::fail(
                    loaded.error.unwrap_or_else(|| "Failed to load accounts".to_string()),
                );
            }
            state = self.state();
        }

        match team_slug {
            None => {
                // Personal-scope routes want the personal workspace active
                if state
                    .current_account
                    .as_ref()
                    .map(|a| a.is_personal())
                    .unwrap_or(false)
                {
                    return OperationResult::ok(true);
                }
                match self.switch_to_account("personal").await {
                    result if result.success => OperationResult::ok(true),
                    result => OperationResult::fail(
                        result.error.unwrap_or_else(|| "Account switch failed".to_string()),
                    ),
                }
            }
            Some(slug) => {
                if state.current_account.as_ref().map(|a| a.slug.as_str()) == Some(slug) {
                    return OperationResult::ok(true);
                }
                if !state.accounts.iter().any(|a| a.slug == slug) {
                    self.apply(StatePatch::new().error(Some(format!(
                        "You don't have access to a workspace named '{}'",
                        slug
                    ))));
                    return OperationResult::ok(false);
                }
                match self.switch_to_account(slug).await {
                    result if result.success => OperationResult::ok(true),
                    result => OperationResult::fail(
                        result.error.unwrap_or_else(|| "Account switch failed".to_string()),
                    ),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Validation and recovery ladder
    // ------------------------------------------------------------------

    /// Re-read the external session and reconcile local state with it
    ///
    /// Three-tier reconciliation when a session exists: full reload when
    /// there is no local user, data reload when the user is present but
    /// accounts are not, minimal user patch when everything else is in
    /// place - avoiding full reloads when only the token refreshed.
    pub async fn validate_session(&self) -> OperationResult<()> {
        let session = match self.auth.get_session().await {
            Ok(session) => session,
            Err(e) => {
                let message = e.to_string();
                self.apply(StatePatch::new().error(Some(message.clone())));
                return OperationResult::fail(message);
            }
        };

        let Some(session) = session else {
            // No session upstream: full local sign-out reset
            self.bump_generation();
            self.replace(AppState::signed_out());
            return OperationResult::ok(());
        };

        let state = self.state();
        match &state.user {
            None => {
                self.apply(
                    StatePatch::new()
                        .user(Some(session.user))
                        .is_authenticated(true),
                );
                let _ = self.load_user_data().await;
            }
            Some(_) if state.accounts.is_empty() => {
                self.apply(StatePatch::new().user(Some(session.user)));
                let _ = self.load_user_data().await;
            }
            Some(_) => {
                // Everything present; only the session's user object may
                // have drifted (token refresh, metadata update)
                self.apply(StatePatch::new().user(Some(session.user)));
            }
        }
        OperationResult::ok(())
    }

    /// Attempt a token refresh and re-authenticate if a session is found
    pub async fn recover_session(&self) -> OperationResult<()> {
        match self.auth.refresh_session().await {
            Ok(Some(session)) => {
                self.apply(
                    StatePatch::new()
                        .user(Some(session.user))
                        .is_authenticated(true)
                        .error(None),
                );
                let _ = self.load_user_data().await;
                OperationResult::ok(())
            }
            Ok(None) => OperationResult::fail("No session available to recover"),
            Err(e) => OperationResult::fail(e.to_string()),
        }
    }

    /// The nuclear option: reset everything and rebuild from a forced
    /// session refresh
    ///
    /// Used when `is_state_corrupted` detects an inconsistent state.
    /// Monitoring pauses for the duration so the periodic validator
    /// doesn't race the rebuild.
    pub async fn force_full_recovery(&self) -> OperationResult<()> {
        self.monitoring_paused.store(true, Ordering::SeqCst);
        self.bump_generation();
        self.replace(AppState::initial());

        let result = match self.auth.refresh_session().await {
            Ok(Some(session)) => {
                self.apply(
                    StatePatch::new()
                        .user(Some(session.user))
                        .is_authenticated(true),
                );
                let loaded = self.load_user_data().await;
                if loaded.success {
                    OperationResult::ok(())
                } else {
                    self.replace(AppState::signed_out());
                    OperationResult::fail(
                        loaded
                            .error
                            .unwrap_or_else(|| "Recovery failed while reloading data".to_string()),
                    )
                }
            }
            Ok(None) => {
                self.replace(AppState::signed_out());
                OperationResult::fail("Unable to recover: no session available")
            }
            Err(e) => {
                self.replace(AppState::signed_out());
                OperationResult::fail(e.to_string())
            }
        };

        self.monitoring_paused.store(false, Ordering::SeqCst);
        result
    }

    /// General-purpose "something looks wrong, fix it" entry point
    pub async fn refresh_data(&self) -> OperationResult<()> {
        if self.is_state_corrupted() {
            return self.force_full_recovery().await;
        }

        let validated = self.validate_session().await;
        if !validated.success {
            return validated;
        }

        if self.state().is_authenticated {
            let loaded = self.load_user_data().await;
            if !loaded.success {
                return self.force_full_recovery().await;
            }
        }
        OperationResult::ok(())
    }

    // ------------------------------------------------------------------
    // Onboarding gate
    // ------------------------------------------------------------------

    /// Route a freshly signed-in user into onboarding when required
    ///
    /// Skipped while an in-flight auth path (confirmation, password
    /// reset) is active to avoid interrupting those flows. Returns
    /// whether a redirect happened.
    pub async fn check_and_redirect_to_onboarding(&self) -> OperationResult<bool> {
        let path = self.router.current_path();
        if onboarding::is_auth_flow_path(&path) {
            return OperationResult::ok(false);
        }

        let state = self.state();
        let Some(user) = state.user else {
            return OperationResult::ok(false);
        };

        if onboarding::needs_onboarding(&user, &state.accounts, Utc::now()) {
            self.router.go_to_onboarding();
            OperationResult::ok(true)
        } else {
            OperationResult::ok(false)
        }
    }
}
