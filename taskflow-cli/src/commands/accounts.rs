//! Accounts command - list accessible workspaces

use anyhow::Result;
use comfy_table::{Cell, Color};

use super::get_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;

    ctx.store.validate_session().await;
    let state = ctx.store.state();

    if !state.is_authenticated {
        anyhow::bail!("Not signed in. Run 'tf login' first.");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&state.accounts)?);
        return Ok(());
    }

    if state.accounts.is_empty() {
        output::warning("No workspaces loaded.");
        return Ok(());
    }

    let current_id = state.current_account.as_ref().map(|a| a.id);
    let mut table = output::create_table();
    table.set_header(vec!["", "Slug", "Name", "Type"]);
    for account in &state.accounts {
        let marker = if Some(account.id) == current_id {
            Cell::new("*").fg(Color::Green)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            marker,
            Cell::new(&account.slug),
            Cell::new(&account.name),
            Cell::new(account.account_type.as_str()),
        ]);
    }
    println!("{}", table);

    Ok(())
}
