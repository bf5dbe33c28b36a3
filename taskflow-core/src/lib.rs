//! Task Flow Core - routing and session logic for the Task Flow client
//!
//! This crate implements the client core following hexagonal architecture:
//!
//! - **domain**: Core entities (User, Account, Session, AppState)
//! - **ports**: Trait definitions for external dependencies (AuthProvider,
//!   WorkspaceDirectory, HistoryBackend)
//! - **router**: Route table, pattern matching, navigation
//! - **services**: Session store, background monitor, onboarding gate, doctor
//! - **adapters**: Concrete implementations (REST service client, in-memory
//!   backend, in-memory history)
//!
//! The rendering layer is an external collaborator: it combines
//! `router.current_page()` / `router.requires_auth()` with `store.state()`
//! to decide what to draw, and redirects when the two disagree.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod router;
pub mod services;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use adapters::{MemoryBackend, MemoryHistory, RestBackend};
use config::Config;
use ports::{AuthProvider, HistoryBackend, WorkspaceDirectory};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{Account, AccountType, AppState, AuthEvent, Session, StatePatch, User};
pub use router::{LinkClick, Page, Route, RouteContext, RouteParams, RouteSnapshot, Router};
pub use services::{DoctorService, SessionMonitor, SessionStore};

/// Main context for Task Flow operations
///
/// This is the primary entry point for hosts. It holds the configuration,
/// the router, the session store, and the background monitor.
pub struct TaskFlowContext {
    pub config: Config,
    pub router: Arc<Router>,
    pub store: Arc<SessionStore>,
    pub monitor: Arc<SessionMonitor>,
    auth: Arc<dyn AuthProvider>,
}

impl TaskFlowContext {
    /// Create a new context from the Task Flow directory
    ///
    /// Demo mode wires the in-memory backend; otherwise the REST backend
    /// is built from the configured service URL and key. The router
    /// starts at the last recorded route, so a restart lands where the
    /// user left off.
    pub fn new(taskflow_dir: &Path) -> Result<Self> {
        let config = Config::load(taskflow_dir)?;

        let (auth, directory): (Arc<dyn AuthProvider>, Arc<dyn WorkspaceDirectory>) =
            if config.demo_mode {
                let backend = Arc::new(MemoryBackend::with_demo_user());
                (backend.clone(), backend)
            } else {
                let backend_url = config.backend_url.as_deref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "Backend URL not configured. Set app.backendUrl in settings.json \
                         or the TASKFLOW_BACKEND_URL environment variable."
                    )
                })?;
                let api_key = config.api_key.as_deref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "API key not configured. Set app.apiKey in settings.json \
                         or the TASKFLOW_API_KEY environment variable."
                    )
                })?;
                let backend = Arc::new(RestBackend::new(backend_url, api_key)?);
                (backend.clone(), backend)
            };

        let initial_route = config.last_route.clone().unwrap_or_else(|| "/".to_string());
        let history = Arc::new(MemoryHistory::new(initial_route));

        Ok(Self::with_backend(config, auth, directory, history))
    }

    /// Create a context with injected adapters (hosts and tests)
    pub fn with_backend(
        config: Config,
        auth: Arc<dyn AuthProvider>,
        directory: Arc<dyn WorkspaceDirectory>,
        history: Arc<dyn HistoryBackend>,
    ) -> Self {
        let router = Arc::new(Router::new(history));
        let store = Arc::new(SessionStore::new(
            auth.clone(),
            directory,
            router.clone(),
        ));
        let monitor = Arc::new(SessionMonitor::new(
            store.clone(),
            Duration::from_secs(config.session_poll_secs),
        ));

        Self {
            config,
            router,
            store,
            monitor,
            auth,
        }
    }

    /// Build a doctor service over this context
    pub fn doctor(&self) -> DoctorService {
        DoctorService::new(self.store.clone(), self.router.clone(), self.auth.clone())
    }
}
