//! Task Flow CLI - the Task Flow client in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{accounts, demo, doctor, login, logout, route, routes, signup, status, switch};

/// Task Flow - task management in your terminal
#[derive(Parser)]
#[command(name = "tf", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show session and workspace status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign in with email and password
    Login {
        /// Email address (prompted when omitted)
        email: Option<String>,
        /// Password (prompted when omitted; prefer the prompt)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register a new user
    Signup {
        /// Email address (prompted when omitted)
        email: Option<String>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out and clear the session
    Logout,

    /// List accessible workspaces
    Accounts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Switch the active workspace
    Switch {
        /// Workspace slug, id, or the literal "personal"
        workspace: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current route, or navigate to a path
    Route {
        /// Path to navigate to (e.g. /app/acme/scopes/42)
        path: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the route table
    Routes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run session and state health checks
    Doctor {
        /// Show verbose output
        #[arg(long, short)]
        verbose: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if atty::isnt(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Status { json } => status::run(json).await,
        Commands::Login { email, password, json } => login::run(email, password, json).await,
        Commands::Signup { email, name, json } => signup::run(email, name, json).await,
        Commands::Logout => logout::run().await,
        Commands::Accounts { json } => accounts::run(json).await,
        Commands::Switch { workspace, json } => switch::run(&workspace, json).await,
        Commands::Route { path, json } => route::run(path.as_deref(), json).await,
        Commands::Routes { json } => routes::run(json),
        Commands::Doctor { verbose, json } => doctor::run(verbose, json).await,
        Commands::Demo { command } => demo::run(command),
    }
}
