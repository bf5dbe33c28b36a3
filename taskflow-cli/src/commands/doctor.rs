//! Doctor command - run session and state health checks

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color};

use super::get_context;
use crate::output;

pub async fn run(verbose: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;

    // Populate the state first so the checks see what the app would see
    ctx.store.validate_session().await;

    let result = ctx.doctor().run_checks().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", "Session Health Check".bold());
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Check", "Status", "Message"]);

    for (check_name, check_result) in &result.checks {
        let status_cell = match check_result.status.as_str() {
            "pass" => Cell::new("PASS").fg(Color::Green),
            "warning" => Cell::new("WARN").fg(Color::Yellow),
            "error" => Cell::new("ERROR").fg(Color::Red),
            _ => Cell::new(&check_result.status),
        };

        table.add_row(vec![
            Cell::new(check_name),
            status_cell,
            Cell::new(&check_result.message),
        ]);

        if verbose {
            if let Some(details) = &check_result.details {
                for detail in details {
                    table.add_row(vec![
                        Cell::new(""),
                        Cell::new(""),
                        Cell::new(format!("  - {}", detail)),
                    ]);
                }
            }
        }
    }

    println!("{}", table);
    println!();

    println!(
        "Summary: {} passed, {} warnings, {} errors",
        result.summary.passed.to_string().green(),
        result.summary.warnings.to_string().yellow(),
        result.summary.errors.to_string().red(),
    );

    if result.summary.errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}
