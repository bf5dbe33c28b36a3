//! Route table and pattern matching
//!
//! Routes are declared once at startup and never mutated. Patterns are
//! plain paths whose segments may start with `:` to capture a value;
//! the single `*` entry is the catch-all.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Captured `:name` segment values for the current path
pub type RouteParams = HashMap<String, String>;

/// Page identifier consumed by the rendering layer
///
/// A closed enum so hosts can match exhaustively; adding a page is a
/// compile-time event, not a stringly-typed convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Home,
    SignIn,
    SignUp,
    ConfirmEmail,
    ResetPassword,
    Onboarding,
    Dashboard,
    Settings,
    TeamDashboard,
    ScopeList,
    ScopeItems,
    TeamSettings,
    NotFound,
}

/// Static route descriptor
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub path: &'static str,
    pub page: Page,
    pub requires_auth: bool,
    pub title: Option<&'static str>,
}

/// The application route table, in declaration order
///
/// Invariants (held by construction, checked by `Router::new` in debug
/// builds): segment counts are consistent per pattern, and exactly one
/// `*` wildcard entry exists.
pub const ROUTES: &[Route] = &[
    Route { path: "/", page: Page::Home, requires_auth: false, title: Some("Task Flow") },
    Route { path: "/auth/sign-in", page: Page::SignIn, requires_auth: false, title: Some("Sign In") },
    Route { path: "/auth/sign-up", page: Page::SignUp, requires_auth: false, title: Some("Sign Up") },
    Route { path: "/auth/confirm", page: Page::ConfirmEmail, requires_auth: false, title: Some("Confirm Email") },
    Route { path: "/auth/reset-password", page: Page::ResetPassword, requires_auth: false, title: Some("Reset Password") },
    Route { path: "/onboarding", page: Page::Onboarding, requires_auth: true, title: Some("Welcome") },
    Route { path: "/dashboard", page: Page::Dashboard, requires_auth: true, title: Some("Dashboard") },
    Route { path: "/settings", page: Page::Settings, requires_auth: true, title: Some("Settings") },
    Route { path: "/app/:teamSlug", page: Page::TeamDashboard, requires_auth: true, title: None },
    Route { path: "/app/:teamSlug/scopes", page: Page::ScopeList, requires_auth: true, title: None },
    Route { path: "/app/:teamSlug/scopes/:scopeId", page: Page::ScopeItems, requires_auth: true, title: None },
    Route { path: "/app/:teamSlug/settings", page: Page::TeamSettings, requires_auth: true, title: None },
    Route { path: "*", page: Page::NotFound, requires_auth: false, title: Some("Not Found") },
];

/// Find the route matching `path`
///
/// Exact matches outrank pattern matches; among pattern matches,
/// declaration order wins. An unmatched path never fails - it resolves
/// to the wildcard entry.
pub fn find_route<'a>(routes: &'a [Route], path: &str) -> &'a Route {
    // Fast path: exact string match
    if let Some(route) = routes.iter().find(|r| r.path == path) {
        return route;
    }

    // Segment-by-segment pattern match, first full match wins
    if let Some(route) = routes
        .iter()
        .filter(|r| r.path != "*")
        .find(|r| pattern_matches(r.path, path))
    {
        return route;
    }

    wildcard(routes)
}

/// The designated `*` catch-all entry
pub fn wildcard(routes: &[Route]) -> &Route {
    routes
        .iter()
        .find(|r| r.path == "*")
        .expect("route table must contain a wildcard entry")
}

/// Extract `:name` captures from `path` against `pattern`
///
/// Returns an empty map when the pattern does not match; callers pair
/// this with `find_route` so the pattern is already known to match.
pub fn extract_params(pattern: &str, path: &str) -> RouteParams {
    let mut params = RouteParams::new();
    if pattern == "*" {
        return params;
    }

    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return params;
    }

    for (pat, value) in pattern_segments.iter().zip(path_segments.iter()) {
        if let Some(name) = pat.strip_prefix(':') {
            params.insert(name.to_string(), (*value).to_string());
        } else if pat != value {
            return RouteParams::new();
        }
    }

    params
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(path_segments.iter())
        .all(|(pat, seg)| pat.starts_with(':') || pat == seg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_wins() {
        let route = find_route(ROUTES, "/dashboard");
        assert_eq!(route.page, Page::Dashboard);
        assert!(route.requires_auth);
    }

    #[test]
    fn test_pattern_match() {
        let route = find_route(ROUTES, "/app/acme");
        assert_eq!(route.page, Page::TeamDashboard);

        let route = find_route(ROUTES, "/app/acme/scopes");
        assert_eq!(route.page, Page::ScopeList);

        let route = find_route(ROUTES, "/app/acme/scopes/42");
        assert_eq!(route.page, Page::ScopeItems);
    }

    #[test]
    fn test_literal_segment_outranks_capture() {
        // "/app/acme/settings" matches both ":scopeId"-free settings
        // pattern and nothing else; declaration order keeps it distinct
        // from the scopes patterns
        let route = find_route(ROUTES, "/app/acme/settings");
        assert_eq!(route.page, Page::TeamSettings);
    }

    #[test]
    fn test_wildcard_fallback() {
        let route = find_route(ROUTES, "/nope/nothing/here");
        assert_eq!(route.page, Page::NotFound);
        assert!(!route.requires_auth);

        let route = find_route(ROUTES, "/app/acme/scopes/42/extra");
        assert_eq!(route.page, Page::NotFound);
    }

    #[test]
    fn test_extract_params() {
        let params = extract_params("/app/:teamSlug/scopes/:scopeId", "/app/acme/scopes/42");
        assert_eq!(params.get("teamSlug").map(String::as_str), Some("acme"));
        assert_eq!(params.get("scopeId").map(String::as_str), Some("42"));

        let params = extract_params("/dashboard", "/dashboard");
        assert!(params.is_empty());

        // Non-matching path yields no captures
        let params = extract_params("/app/:teamSlug", "/other/acme");
        assert!(params.is_empty());
    }

    #[test]
    fn test_single_wildcard_entry() {
        let count = ROUTES.iter().filter(|r| r.path == "*").count();
        assert_eq!(count, 1);
    }
}
