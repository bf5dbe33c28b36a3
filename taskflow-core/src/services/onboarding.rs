//! Onboarding gate - decides whether a signed-in user must be routed
//! into the first-run flow

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Account, User};

/// Window after registration during which a user with no team is always
/// sent to onboarding
const RECENT_SIGNUP_HOURS: i64 = 24;

/// Paths that are in-flight auth flows; the onboarding check must not
/// interrupt them
pub fn is_auth_flow_path(path: &str) -> bool {
    path.starts_with("/auth/confirm") || path.starts_with("/auth/reset-password")
}

/// Whether the user must be routed to the onboarding flow
///
/// A user with any team account is never redirected. Otherwise the
/// user-metadata `onboarding_completed` flag short-circuits the check,
/// and the redirect triggers when the account is recent (<24h) or either
/// completion timestamp is missing from the personal workspace.
pub fn needs_onboarding(user: &User, accounts: &[Account], now: DateTime<Utc>) -> bool {
    if accounts.iter().any(|a| a.is_team()) {
        return false;
    }
    if user.metadata_flag("onboarding_completed") {
        return false;
    }

    let personal = accounts.iter().find(|a| a.is_personal());
    let profile_done = personal.map_or(false, |a| a.profile_completed_at().is_some());
    let preferences_done = personal.map_or(false, |a| a.preferences_completed_at().is_some());

    let recent = now.signed_duration_since(user.created_at) < Duration::hours(RECENT_SIGNUP_HOURS);

    recent || !profile_done || !preferences_done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountType;
    use serde_json::json;
    use uuid::Uuid;

    fn user_created(hours_ago: i64) -> User {
        let mut user = User::new(Uuid::new_v4(), "test@example.com");
        user.created_at = Utc::now() - Duration::hours(hours_ago);
        user
    }

    fn personal_with_flags(profile: bool, preferences: bool) -> Account {
        let mut account = Account::new(Uuid::new_v4(), "me", "Personal", AccountType::Personal);
        if profile {
            account
                .account_info
                .insert("profile_completed_at".to_string(), json!("2025-01-01T00:00:00Z"));
        }
        if preferences {
            account.account_info.insert(
                "preferences_completed_at".to_string(),
                json!("2025-01-01T00:00:00Z"),
            );
        }
        account
    }

    fn team() -> Account {
        Account::new(Uuid::new_v4(), "acme", "Acme", AccountType::Team)
    }

    #[test]
    fn test_fresh_user_without_team_is_redirected() {
        let user = user_created(1);
        let accounts = vec![personal_with_flags(true, true)];
        assert!(needs_onboarding(&user, &accounts, Utc::now()));
    }

    #[test]
    fn test_team_account_skips_onboarding() {
        let user = user_created(1);
        let accounts = vec![personal_with_flags(false, false), team()];
        assert!(!needs_onboarding(&user, &accounts, Utc::now()));
    }

    #[test]
    fn test_missing_completion_flags_redirect_old_user() {
        let user = user_created(100);
        let accounts = vec![personal_with_flags(true, false)];
        assert!(needs_onboarding(&user, &accounts, Utc::now()));

        let accounts = vec![personal_with_flags(false, true)];
        assert!(needs_onboarding(&user, &accounts, Utc::now()));
    }

    #[test]
    fn test_completed_old_user_not_redirected() {
        let user = user_created(100);
        let accounts = vec![personal_with_flags(true, true)];
        assert!(!needs_onboarding(&user, &accounts, Utc::now()));
    }

    #[test]
    fn test_user_metadata_fallback_flag() {
        let mut user = user_created(1);
        user.metadata
            .insert("onboarding_completed".to_string(), json!(true));
        let accounts = vec![personal_with_flags(false, false)];
        assert!(!needs_onboarding(&user, &accounts, Utc::now()));
    }

    #[test]
    fn test_auth_flow_paths_excluded() {
        assert!(is_auth_flow_path("/auth/confirm"));
        assert!(is_auth_flow_path("/auth/confirm?email=a%40b.c"));
        assert!(is_auth_flow_path("/auth/reset-password"));
        assert!(!is_auth_flow_path("/auth/sign-in"));
        assert!(!is_auth_flow_path("/dashboard"));
    }
}
