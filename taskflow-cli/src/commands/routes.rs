//! Routes command - list the route table

use anyhow::Result;
use serde_json::json;

use crate::output;
use taskflow_core::router::ROUTES;

pub fn run(json: bool) -> Result<()> {
    if json {
        let entries: Vec<_> = ROUTES
            .iter()
            .map(|route| {
                json!({
                    "path": route.path,
                    "page": output::page_name(route.page),
                    "requiresAuth": route.requires_auth,
                    "title": route.title,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Path", "Page", "Auth", "Title"]);
    for route in ROUTES {
        table.add_row(vec![
            route.path,
            &output::page_name(route.page),
            if route.requires_auth { "yes" } else { "" },
            route.title.unwrap_or(""),
        ]);
    }
    println!("{}", table);

    Ok(())
}
