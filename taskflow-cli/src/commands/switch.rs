//! Switch command - change the active workspace

use anyhow::Result;
use serde_json::json;

use super::get_context;
use crate::output;

pub async fn run(workspace: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;

    ctx.store.validate_session().await;
    if !ctx.store.state().is_authenticated {
        anyhow::bail!("Not signed in. Run 'tf login' first.");
    }

    let result = ctx.store.switch_to_account(workspace).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({
            "success": result.success,
            "account": result.data,
            "error": result.error,
        }))?);
        return Ok(());
    }

    match result.data {
        Some(account) => {
            output::success(&format!(
                "Switched to {} ({})",
                account.slug,
                account.account_type.as_str()
            ));
            Ok(())
        }
        None => anyhow::bail!(
            "{}",
            result.error.unwrap_or_else(|| "Switch failed".to_string())
        ),
    }
}
