//! Status command - show session and workspace status

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use super::get_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;

    // Reconcile local state with whatever session the service holds
    // before reporting anything
    let validated = ctx.store.validate_session().await;
    let state = ctx.store.state();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "demoMode": ctx.config.demo_mode,
                "validated": validated.success,
                "route": {
                    "path": ctx.router.current_path(),
                    "page": output::page_name(ctx.router.current_page()),
                    "requiresAuth": ctx.router.requires_auth(),
                },
                "state": state,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Task Flow Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec![
        "Mode",
        if ctx.config.demo_mode { "demo" } else { "live" },
    ]);
    table.add_row(vec![
        "Signed in",
        if state.is_authenticated { "yes" } else { "no" },
    ]);
    if let Some(user) = &state.user {
        table.add_row(vec!["User", &user.email]);
    }
    if let Some(account) = &state.current_account {
        table.add_row(vec![
            "Workspace",
            &format!("{} ({})", account.slug, account.account_type.as_str()),
        ]);
    }
    table.add_row(vec!["Workspaces", &state.accounts.len().to_string()]);
    table.add_row(vec!["Route", &ctx.router.current_path()]);
    println!("{}", table);

    if let Some(error) = &state.error {
        println!();
        output::warning(&format!("Last error: {}", error));
    }

    if !state.is_authenticated {
        println!();
        output::info("Run 'tf login' to sign in, or 'tf demo on' for demo mode.");
    }

    Ok(())
}
