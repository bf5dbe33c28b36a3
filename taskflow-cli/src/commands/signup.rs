//! Signup command - register a new user

use anyhow::Result;
use dialoguer::{Input, Password};
use serde_json::json;

use super::get_context;
use crate::output;

pub async fn run(email: Option<String>, name: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let name = match name {
        Some(name) => name,
        None => Input::new()
            .with_prompt("Display name")
            .allow_empty(true)
            .interact_text()?,
    };
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let result = ctx.store.sign_up(&email, &password, &name).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({
            "success": result.success,
            "user": result.data,
            "error": result.error,
            "route": ctx.router.current_path(),
        }))?);
        return Ok(());
    }

    match result.error {
        None => {
            output::success(&format!("Account created for {}", email));
            println!("Check your inbox for a confirmation email before signing in.");
            Ok(())
        }
        Some(message) => anyhow::bail!("{}", message),
    }
}
