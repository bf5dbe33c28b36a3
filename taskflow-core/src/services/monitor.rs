//! Session monitor - background revalidation tied to explicit lifecycle
//!
//! Owns its timer handles: `start` spawns the periodic validator,
//! `stop` (or drop) aborts everything. Hosts forward visibility and
//! connectivity events from whatever lifecycle they have.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::services::SessionStore;

/// Default period between background session validations
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Debounce before a visibility-triggered revalidation
const VISIBILITY_DEBOUNCE: Duration = Duration::from_secs(1);

pub struct SessionMonitor {
    store: Arc<SessionStore>,
    poll_interval: Duration,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
    debounce_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SessionMonitor {
    pub fn new(store: Arc<SessionStore>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
            poll_handle: Mutex::new(None),
            debounce_handle: Mutex::new(None),
        }
    }

    /// Start the periodic validator; restarts it if already running
    pub fn start(&self) {
        let store = Arc::clone(&self.store);
        let period = self.poll_interval;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it so starting the
            // monitor doesn't double-validate right after init
            interval.tick().await;
            loop {
                interval.tick().await;
                if store.is_monitoring_paused() {
                    continue;
                }
                if store.state().is_authenticated {
                    let _ = store.validate_session().await;
                }
            }
        });

        if let Some(previous) = self.poll_handle.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    /// Stop all background tasks
    pub fn stop(&self) {
        if let Some(handle) = self.poll_handle.lock().unwrap().take() {
            handle.abort();
        }
        if let Some(handle) = self.debounce_handle.lock().unwrap().take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.poll_handle
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// The tab regained or lost visibility
    ///
    /// Revalidates only when critical data (user, or accounts while
    /// authenticated) is missing, and only after a debounce, so merely
    /// refocusing the tab doesn't thrash the auth service.
    pub fn handle_visibility_change(&self, visible: bool) {
        if !visible {
            return;
        }

        let state = self.store.state();
        if !state.is_authenticated || state.has_critical_data() {
            return;
        }

        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(VISIBILITY_DEBOUNCE).await;
            if store.is_monitoring_paused() {
                return;
            }
            let _ = store.validate_session().await;
        });

        if let Some(previous) = self.debounce_handle.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    /// Network connectivity was restored
    pub async fn handle_online(&self) {
        if self.store.state().is_authenticated && !self.store.is_monitoring_paused() {
            let _ = self.store.validate_session().await;
        }
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
