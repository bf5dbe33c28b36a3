//! Demo command - manage demo mode

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_taskflow_dir;
use taskflow_core::config::Config;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off,
    /// Show demo mode status
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let taskflow_dir = get_taskflow_dir();
    std::fs::create_dir_all(&taskflow_dir)?;
    let mut config = Config::load(&taskflow_dir)?;

    match command {
        Some(DemoCommands::On) => {
            config.enable_demo_mode();
            config.save(&taskflow_dir)?;
            println!("{}", "Demo mode enabled".green());
            println!("Sign in with demo@taskflow.app / taskflow-demo. Run 'tf login' to try it.");
            Ok(())
        }
        Some(DemoCommands::Off) => {
            config.disable_demo_mode();
            config.save(&taskflow_dir)?;
            println!("{}", "Demo mode disabled".yellow());
            Ok(())
        }
        Some(DemoCommands::Status) | None => {
            if config.demo_mode {
                println!("Demo mode is {}", "ON".green());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
            Ok(())
        }
    }
}
