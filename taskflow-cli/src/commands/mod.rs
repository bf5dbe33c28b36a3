//! CLI command implementations

pub mod accounts;
pub mod demo;
pub mod doctor;
pub mod login;
pub mod logout;
pub mod route;
pub mod routes;
pub mod signup;
pub mod status;
pub mod switch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use taskflow_core::TaskFlowContext;

/// Get the Task Flow directory from environment or default
pub fn get_taskflow_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TASKFLOW_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".taskflow")
    }
}

/// Get or create the Task Flow context
pub fn get_context() -> Result<TaskFlowContext> {
    let taskflow_dir = get_taskflow_dir();

    std::fs::create_dir_all(&taskflow_dir)
        .with_context(|| format!("Failed to create Task Flow directory: {:?}", taskflow_dir))?;

    TaskFlowContext::new(&taskflow_dir).context("Failed to initialize Task Flow context")
}
