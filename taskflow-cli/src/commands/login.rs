//! Login command - sign in with email and password

use anyhow::Result;
use dialoguer::{Input, Password};
use serde_json::json;

use super::get_context;
use crate::output;
use taskflow_core::AuthEvent;

pub async fn run(email: Option<String>, password: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    let result = ctx.store.sign_in(&email, &password).await;
    let session = match result.data {
        Some(session) => session,
        None => {
            let message = result
                .error
                .unwrap_or_else(|| "Sign-in failed".to_string());
            if json {
                println!("{}", serde_json::to_string_pretty(&json!({
                    "success": false,
                    "error": message,
                }))?);
                return Ok(());
            }
            anyhow::bail!("{}", message);
        }
    };

    // Drive the same event flow the app shell runs: load the user's
    // workspaces and apply the onboarding gate
    ctx.store
        .handle_auth_event(AuthEvent::SignedIn(session))
        .await;
    let state = ctx.store.state();

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({
            "success": true,
            "route": ctx.router.current_path(),
            "state": state,
        }))?);
        return Ok(());
    }

    output::success(&format!("Signed in as {}", email));
    if let Some(account) = &state.current_account {
        println!("Active workspace: {} ({})", account.slug, account.account_type.as_str());
    }
    println!("Workspaces: {}", state.accounts.len());
    if ctx.router.current_path() == "/onboarding" {
        output::info("This account still needs onboarding; continue in the app.");
    }

    Ok(())
}
