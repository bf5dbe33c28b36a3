//! Logout command - sign out and clear the session

use anyhow::Result;

use super::get_context;
use crate::output;
use taskflow_core::AuthEvent;

pub async fn run() -> Result<()> {
    let ctx = get_context()?;

    let result = ctx.store.sign_out().await;
    if let Some(message) = result.error {
        anyhow::bail!("{}", message);
    }
    ctx.store.handle_auth_event(AuthEvent::SignedOut).await;

    output::success("Signed out");
    Ok(())
}
