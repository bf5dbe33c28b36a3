//! Client-side router
//!
//! Maintains the current location, matches it against the static route
//! table, extracts path parameters, and exposes imperative navigation.
//! The only persisted routing state is the location held by the
//! `HistoryBackend` port; everything else is derived on each navigation.

mod routes;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use url::form_urlencoded;

use crate::ports::HistoryBackend;

pub use routes::{extract_params, find_route, Page, Route, RouteParams, ROUTES};

/// Immutable-per-navigation bundle of params and query parameters
///
/// Recomputed whenever the path changes; readers get a clone and never
/// observe a half-updated context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteContext {
    pub params: RouteParams,
    pub query: HashMap<String, String>,
}

/// Snapshot broadcast to subscribers on every navigation
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSnapshot {
    pub path: String,
    pub page: Page,
    pub requires_auth: bool,
    pub params: RouteParams,
}

/// An in-page link activation, as reported by the host
///
/// Carries everything the interception policy needs: the raw href, the
/// link target, and which modifier keys were held.
#[derive(Debug, Clone, Default)]
pub struct LinkClick {
    pub href: String,
    pub target: Option<String>,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl LinkClick {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    fn has_modifier(&self) -> bool {
        self.ctrl || self.meta || self.shift || self.alt
    }
}

struct RouterInner {
    path: String,
    search: String,
    context: RouteContext,
}

/// The application router
///
/// Cheap to share behind an `Arc`; all mutation goes through the inner
/// mutex and every change is broadcast on the watch channel.
pub struct Router {
    routes: &'static [Route],
    history: Arc<dyn HistoryBackend>,
    inner: Mutex<RouterInner>,
    tx: watch::Sender<RouteSnapshot>,
}

impl Router {
    /// Create a router over the given history backend
    ///
    /// The initial location is read from the backend so a restored URL
    /// resolves to the right page before any navigation happens.
    pub fn new(history: Arc<dyn HistoryBackend>) -> Self {
        Self::with_routes(ROUTES, history)
    }

    /// Create a router with a custom route table (used by tests)
    pub fn with_routes(routes: &'static [Route], history: Arc<dyn HistoryBackend>) -> Self {
        debug_assert_eq!(
            routes.iter().filter(|r| r.path == "*").count(),
            1,
            "route table must contain exactly one wildcard entry"
        );

        let location = history.current();
        let (path, search) = split_location(&location);
        let route = find_route(routes, &path);
        let context = RouteContext {
            params: extract_params(route.path, &path),
            query: parse_query(&search),
        };
        let snapshot = RouteSnapshot {
            path: path.clone(),
            page: route.page,
            requires_auth: route.requires_auth,
            params: context.params.clone(),
        };
        let (tx, _) = watch::channel(snapshot);

        Self {
            routes,
            history,
            inner: Mutex::new(RouterInner { path, search, context }),
            tx,
        }
    }

    /// Navigate to a new location
    ///
    /// Pushes (or replaces) a history entry, resynchronizes all derived
    /// state, and notifies subscribers. Side effect only; an unmatched
    /// path resolves to the wildcard route rather than failing.
    pub fn navigate(&self, location: &str, replace: bool) {
        if replace {
            self.history.replace(location);
        } else {
            self.history.push(location);
        }
        self.resync(location);
    }

    /// Traverse one history entry back
    ///
    /// Resynchronization happens off the location the backend reports,
    /// mirroring the reactive popstate path rather than assuming the
    /// traversal succeeded.
    pub fn back(&self) {
        if let Some(location) = self.history.back() {
            self.resync(&location);
        }
    }

    /// Traverse one history entry forward
    pub fn forward(&self) {
        if let Some(location) = self.history.forward() {
            self.resync(&location);
        }
    }

    /// Handle a location change that did not originate from this router
    /// (browser back/forward, host-driven deep link)
    pub fn handle_external_change(&self, location: &str) {
        self.resync(location);
    }

    /// Decide whether an in-page link click should be intercepted
    ///
    /// Returns the location to navigate to, or `None` for cross-origin
    /// links, `target="_blank"` links, non-http(s) schemes, and clicks
    /// with a modifier key held - those keep their default behavior.
    pub fn intercept_link(&self, click: &LinkClick, current_origin: &str) -> Option<String> {
        if click.has_modifier() {
            return None;
        }
        if click.target.as_deref() == Some("_blank") {
            return None;
        }
        if click.href.is_empty() {
            return None;
        }

        let parsed = match url::Url::parse(&click.href) {
            Ok(parsed) => parsed,
            // Relative hrefs resolve against the current origin before
            // the origin check; protocol-relative hrefs ("//host/path")
            // pick up a host here and fail that check when cross-origin
            Err(url::ParseError::RelativeUrlWithoutBase) => url::Url::parse(current_origin)
                .ok()?
                .join(&click.href)
                .ok()?,
            Err(_) => return None,
        };

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return None;
        }
        if parsed.origin().ascii_serialization() != current_origin {
            return None;
        }

        let mut location = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            location.push('?');
            location.push_str(query);
        }
        if let Some(fragment) = parsed.fragment() {
            location.push('#');
            location.push_str(fragment);
        }
        Some(location)
    }

    /// Intercept-and-navigate; returns true when the click was handled
    pub fn handle_link_click(&self, click: &LinkClick, current_origin: &str) -> bool {
        match self.intercept_link(click, current_origin) {
            Some(location) => {
                self.navigate(&location, false);
                true
            }
            None => false,
        }
    }

    /// The currently matched route entry
    fn current_route(&self) -> &'static Route {
        let inner = self.inner.lock().unwrap();
        find_route(self.routes, &inner.path)
    }

    /// Current path (without search or hash)
    pub fn current_path(&self) -> String {
        self.inner.lock().unwrap().path.clone()
    }

    /// Whether the matched route requires authentication
    pub fn requires_auth(&self) -> bool {
        self.current_route().requires_auth
    }

    /// The matched route's page identifier (wildcard's for a miss)
    pub fn current_page(&self) -> Page {
        self.current_route().page
    }

    /// The matched route's display title, if declared
    pub fn title(&self) -> Option<&'static str> {
        self.current_route().title
    }

    /// Params and query for the current navigation
    pub fn context(&self) -> RouteContext {
        self.inner.lock().unwrap().context.clone()
    }

    /// Subscribe to navigation changes
    pub fn subscribe(&self) -> watch::Receiver<RouteSnapshot> {
        self.tx.subscribe()
    }

    // Named convenience navigators; thin wrappers with pre-built paths.

    pub fn go_home(&self) {
        self.navigate("/", false);
    }

    pub fn go_to_sign_in(&self) {
        self.navigate("/auth/sign-in", false);
    }

    pub fn go_to_sign_up(&self) {
        self.navigate("/auth/sign-up", false);
    }

    pub fn go_to_dashboard(&self) {
        self.navigate("/dashboard", false);
    }

    pub fn go_to_onboarding(&self) {
        self.navigate("/onboarding", false);
    }

    pub fn go_to_confirm_email(&self, email: &str) {
        let encoded: String = form_urlencoded::byte_serialize(email.as_bytes()).collect();
        self.navigate(&format!("/auth/confirm?email={}", encoded), false);
    }

    pub fn go_to_team(&self, slug: &str) {
        self.navigate(&format!("/app/{}", slug), false);
    }

    pub fn go_to_scope(&self, slug: &str, scope_id: &str) {
        self.navigate(&format!("/app/{}/scopes/{}", slug, scope_id), false);
    }

    fn resync(&self, location: &str) {
        let (path, search) = split_location(location);
        let route = find_route(self.routes, &path);

        let mut inner = self.inner.lock().unwrap();
        let path_changed = inner.path != path;
        if path_changed || inner.search != search {
            inner.context = RouteContext {
                params: extract_params(route.path, &path),
                query: parse_query(&search),
            };
        }
        inner.path = path.clone();
        inner.search = search;
        let snapshot = RouteSnapshot {
            path,
            page: route.page,
            requires_auth: route.requires_auth,
            params: inner.context.params.clone(),
        };
        drop(inner);

        // send_replace never fails, even with no subscribers
        self.tx.send_replace(snapshot);
    }
}

/// Split a location into path and raw query string, dropping the hash
fn split_location(location: &str) -> (String, String) {
    let without_hash = match location.split_once('#') {
        Some((head, _)) => head,
        None => location,
    };
    match without_hash.split_once('?') {
        Some((path, search)) => (normalize_path(path), search.to_string()),
        None => (normalize_path(without_hash), String::new()),
    }
}

fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    // Collapse trailing slashes so "/dashboard/" and "/dashboard" match
    // the same entry; a path of only slashes is the root.
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_query(search: &str) -> HashMap<String, String> {
    form_urlencoded::parse(search.as_bytes())
        .into_owned()
        .collect()
}
