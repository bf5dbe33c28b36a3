//! Integration tests for routing, the onboarding gate, and the monitor
//!
//! Exercises the assembled context (router + store + monitor) the way a
//! host shell would drive it.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde_json::json;

use taskflow_core::adapters::{MemoryBackend, MemoryHistory};
use taskflow_core::config::Config;
use taskflow_core::ports::WorkspaceDirectory;
use taskflow_core::{AuthEvent, LinkClick, Page, SessionMonitor, TaskFlowContext};

fn demo_context() -> (Arc<MemoryBackend>, TaskFlowContext) {
    let backend = Arc::new(MemoryBackend::with_demo_user());
    let context = TaskFlowContext::with_backend(
        Config::default(),
        backend.clone(),
        backend.clone(),
        Arc::new(MemoryHistory::new("/")),
    );
    (backend, context)
}

async fn sign_in(ctx: &TaskFlowContext, email: &str, password: &str) {
    let result = ctx.store.sign_in(email, password).await;
    assert!(result.success, "sign_in failed: {:?}", result.error);
    let session = result.data.unwrap();
    ctx.store
        .handle_auth_event(AuthEvent::SignedIn(session))
        .await;
}

// ============================================================================
// Route gating and deep links
// ============================================================================

#[tokio::test]
async fn test_protected_route_while_signed_out() {
    let (_backend, ctx) = demo_context();

    ctx.router.navigate("/dashboard", false);
    // The host redirects when a protected route meets an unauthenticated
    // state; both signals must be readable together
    assert!(ctx.router.requires_auth());
    assert!(!ctx.store.state().is_authenticated);

    ctx.router.go_to_sign_in();
    assert_eq!(ctx.router.current_page(), Page::SignIn);
    assert!(!ctx.router.requires_auth());
}

#[tokio::test]
async fn test_deep_link_restored_at_startup() {
    let backend = Arc::new(MemoryBackend::with_demo_user());
    let ctx = TaskFlowContext::with_backend(
        Config::default(),
        backend.clone(),
        backend,
        Arc::new(MemoryHistory::new("/app/acme/scopes/7")),
    );

    assert_eq!(ctx.router.current_page(), Page::ScopeItems);
    sign_in(&ctx, "demo@taskflow.app", "taskflow-demo").await;

    // The route's team param drives the active account
    let slug = ctx.router.context().params.get("teamSlug").cloned();
    let result = ctx
        .store
        .ensure_correct_account_for_route(slug.as_deref())
        .await;
    assert!(result.success);
    assert_eq!(result.data, Some(true));
    assert_eq!(
        ctx.store
            .state()
            .current_account
            .as_ref()
            .map(|a| a.slug.as_str()),
        Some("acme")
    );
}

#[tokio::test]
async fn test_link_click_drives_store_alignment() {
    let (_backend, ctx) = demo_context();
    sign_in(&ctx, "demo@taskflow.app", "taskflow-demo").await;

    let handled = ctx
        .router
        .handle_link_click(&LinkClick::new("/app/acme"), "https://taskflow.app");
    assert!(handled);
    assert_eq!(ctx.router.current_page(), Page::TeamDashboard);

    let slug = ctx.router.context().params.get("teamSlug").cloned();
    ctx.store
        .ensure_correct_account_for_route(slug.as_deref())
        .await;
    assert!(ctx.store.state().current_account.as_ref().map(|a| a.is_team()).unwrap_or(false));

    // Back to the personal dashboard realigns the account too
    ctx.router.back();
    assert_eq!(ctx.router.current_path(), "/");
    ctx.store.ensure_correct_account_for_route(None).await;
    assert!(ctx
        .store
        .state()
        .current_account
        .as_ref()
        .map(|a| a.is_personal())
        .unwrap_or(false));
}

// ============================================================================
// Onboarding gate end to end
// ============================================================================

#[tokio::test]
async fn test_fresh_user_lands_on_onboarding() {
    let backend = Arc::new(MemoryBackend::new());
    let ctx = TaskFlowContext::with_backend(
        Config::default(),
        backend.clone(),
        backend.clone(),
        Arc::new(MemoryHistory::new("/")),
    );

    let result = ctx
        .store
        .sign_up("jane@example.com", "password123", "Jane")
        .await;
    assert!(result.success);
    assert_eq!(ctx.router.current_page(), Page::ConfirmEmail);

    backend.confirm_email("jane@example.com").unwrap();

    // The user comes back through the sign-in page; confirmation is no
    // longer in flight, so the onboarding check may redirect
    ctx.router.go_to_sign_in();
    sign_in(&ctx, "jane@example.com", "password123").await;

    assert_eq!(ctx.router.current_page(), Page::Onboarding);
    assert!(ctx.store.state().is_authenticated);
}

#[tokio::test]
async fn test_confirmation_flow_is_not_interrupted() {
    let backend = Arc::new(MemoryBackend::new());
    let ctx = TaskFlowContext::with_backend(
        Config::default(),
        backend.clone(),
        backend.clone(),
        Arc::new(MemoryHistory::new("/")),
    );

    ctx.store
        .sign_up("jane@example.com", "password123", "Jane")
        .await;
    backend.confirm_email("jane@example.com").unwrap();

    // Still on /auth/confirm when the session materializes
    assert_eq!(ctx.router.current_page(), Page::ConfirmEmail);
    sign_in(&ctx, "jane@example.com", "password123").await;

    // No redirect away from the confirmation view
    assert_eq!(ctx.router.current_page(), Page::ConfirmEmail);
}

#[tokio::test]
async fn test_settled_user_skips_onboarding() {
    let backend = Arc::new(MemoryBackend::new());
    let ctx = TaskFlowContext::with_backend(
        Config::default(),
        backend.clone(),
        backend.clone(),
        Arc::new(MemoryHistory::new("/")),
    );

    let result = ctx
        .store
        .sign_up("jane@example.com", "password123", "Jane")
        .await;
    let user = result.data.unwrap();
    backend.confirm_email("jane@example.com").unwrap();
    backend.age_user("jane@example.com", Duration::hours(48)).unwrap();

    // Both onboarding steps recorded on the personal workspace
    let personal = backend.get_personal_workspace(user.id).await.unwrap();
    backend
        .set_account_info(personal.id, "profile_completed_at", json!("2026-08-01T00:00:00Z"))
        .unwrap();
    backend
        .set_account_info(
            personal.id,
            "preferences_completed_at",
            json!("2026-08-01T00:00:00Z"),
        )
        .unwrap();

    ctx.router.go_to_sign_in();
    sign_in(&ctx, "jane@example.com", "password123").await;

    assert_ne!(ctx.router.current_page(), Page::Onboarding);
}

#[tokio::test]
async fn test_team_member_skips_onboarding() {
    let backend = Arc::new(MemoryBackend::new());
    let ctx = TaskFlowContext::with_backend(
        Config::default(),
        backend.clone(),
        backend.clone(),
        Arc::new(MemoryHistory::new("/")),
    );

    let result = ctx
        .store
        .sign_up("jane@example.com", "password123", "Jane")
        .await;
    let user = result.data.unwrap();
    backend.confirm_email("jane@example.com").unwrap();
    backend.add_team(user.id, "widgets", "Widgets Inc").unwrap();

    ctx.router.go_to_sign_in();
    sign_in(&ctx, "jane@example.com", "password123").await;

    assert_ne!(ctx.router.current_page(), Page::Onboarding);
    assert_eq!(ctx.store.state().accounts.len(), 2);
}

// ============================================================================
// Session monitor lifecycle
// ============================================================================

#[tokio::test]
async fn test_monitor_start_stop() {
    let (_backend, ctx) = demo_context();
    assert!(!ctx.monitor.is_running());

    ctx.monitor.start();
    assert!(ctx.monitor.is_running());

    ctx.monitor.stop();
    assert!(!ctx.monitor.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_periodic_validation_resets_dead_session() {
    let (backend, ctx) = demo_context();
    sign_in(&ctx, "demo@taskflow.app", "taskflow-demo").await;

    let monitor = SessionMonitor::new(ctx.store.clone(), StdDuration::from_secs(300));
    monitor.start();

    // The session is revoked server-side; the next poll notices
    backend.drop_session();
    tokio::time::sleep(StdDuration::from_secs(301)).await;
    tokio::task::yield_now().await;

    assert!(!ctx.store.state().is_authenticated);
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_visibility_change_noop_when_data_present() {
    let (_backend, ctx) = demo_context();
    sign_in(&ctx, "demo@taskflow.app", "taskflow-demo").await;
    assert!(ctx.store.state().has_critical_data());
    let before = ctx.store.state();

    // Refocusing the tab with critical data loaded schedules nothing
    ctx.monitor.handle_visibility_change(true);
    tokio::time::sleep(StdDuration::from_secs(2)).await;
    assert_eq!(ctx.store.state(), before);
}

#[tokio::test(start_paused = true)]
async fn test_visibility_change_repairs_missing_accounts() {
    // Directory that rejects the first data load, then heals
    struct FirstLoadFails {
        inner: Arc<MemoryBackend>,
        failed: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl taskflow_core::ports::WorkspaceDirectory for FirstLoadFails {
        async fn list_accounts(
            &self,
            user_id: uuid::Uuid,
        ) -> taskflow_core::domain::result::Result<Vec<taskflow_core::Account>> {
            if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(taskflow_core::Error::service("directory unavailable"));
            }
            self.inner.list_accounts(user_id).await
        }

        async fn get_personal_workspace(
            &self,
            user_id: uuid::Uuid,
        ) -> taskflow_core::domain::result::Result<taskflow_core::Account> {
            self.inner.get_personal_workspace(user_id).await
        }

        async fn get_team_workspace(
            &self,
            slug: &str,
        ) -> taskflow_core::domain::result::Result<taskflow_core::Account> {
            self.inner.get_team_workspace(slug).await
        }

        async fn update_account(
            &self,
            account: &taskflow_core::Account,
        ) -> taskflow_core::domain::result::Result<taskflow_core::Account> {
            self.inner.update_account(account).await
        }
    }

    let backend = Arc::new(MemoryBackend::with_demo_user());
    let directory = Arc::new(FirstLoadFails {
        inner: backend.clone(),
        failed: std::sync::atomic::AtomicBool::new(false),
    });
    let ctx = TaskFlowContext::with_backend(
        Config::default(),
        backend.clone(),
        directory,
        Arc::new(MemoryHistory::new("/")),
    );

    // The initial load fails, leaving an authenticated user with no
    // accounts
    sign_in(&ctx, "demo@taskflow.app", "taskflow-demo").await;
    assert!(!ctx.store.state().has_critical_data());
    assert!(ctx.store.state().is_authenticated);

    // Refocusing the tab triggers a debounced revalidation that repairs
    // the state through the data-reload tier
    ctx.monitor.handle_visibility_change(true);
    tokio::time::sleep(StdDuration::from_secs(2)).await;
    tokio::task::yield_now().await;

    let state = ctx.store.state();
    assert!(state.has_critical_data());
    assert_eq!(state.accounts.len(), 2);
}

#[tokio::test]
async fn test_online_event_revalidates() {
    let (backend, ctx) = demo_context();
    sign_in(&ctx, "demo@taskflow.app", "taskflow-demo").await;

    backend.drop_session();
    ctx.monitor.handle_online().await;

    assert!(!ctx.store.state().is_authenticated);
}
