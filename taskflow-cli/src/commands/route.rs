//! Route command - inspect the current route or navigate

use anyhow::Result;
use serde_json::json;

use super::{get_context, get_taskflow_dir};
use crate::output;

pub async fn run(path: Option<&str>, json: bool) -> Result<()> {
    let mut ctx = get_context()?;

    if let Some(path) = path {
        ctx.router.navigate(path, false);
        // Remember where we are so the next start restores the location
        ctx.config.record_last_route(ctx.router.current_path());
        ctx.config.save(&get_taskflow_dir())?;
    }

    let context = ctx.router.context();

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({
            "path": ctx.router.current_path(),
            "page": output::page_name(ctx.router.current_page()),
            "requiresAuth": ctx.router.requires_auth(),
            "title": ctx.router.title(),
            "params": context.params,
            "query": context.query,
        }))?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.add_row(vec!["Path", &ctx.router.current_path()]);
    table.add_row(vec!["Page", &output::page_name(ctx.router.current_page())]);
    table.add_row(vec![
        "Requires auth",
        if ctx.router.requires_auth() { "yes" } else { "no" },
    ]);
    if let Some(title) = ctx.router.title() {
        table.add_row(vec!["Title", title]);
    }
    for (key, value) in &context.params {
        table.add_row(vec![&format!(":{}", key), value]);
    }
    for (key, value) in &context.query {
        table.add_row(vec![&format!("?{}", key), value]);
    }
    println!("{}", table);

    Ok(())
}
