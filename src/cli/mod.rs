//! Command-line interface for operating the rule engine.

pub mod commands;
pub mod display;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::application::RuleEngine;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::PluginRegistry;

use commands::event_type::EventTypeArgs;
use commands::init::InitArgs;
use commands::plugin::PluginArgs;
use commands::rule::RuleArgs;
use commands::run::RunArgs;
use commands::schedule::ScheduleArgs;
use commands::tick::TickArgs;

#[derive(Parser, Debug)]
#[command(name = "event-rules", version, about = "Event automation rules and scheduler")]
pub struct Cli {
    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .event-rules/config.yaml layering)
    #[arg(long, global = true, env = "EVENT_RULES_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the project directory, config file and database
    Init(InitArgs),
    /// Run one scheduler tick
    Tick(TickArgs),
    /// Tick on an interval until interrupted
    Run(RunArgs),
    /// Manage rules
    Rule(RuleArgs),
    /// Inspect schedules and the work queue
    Schedule(ScheduleArgs),
    /// Manage event types and their default rule templates
    EventType(EventTypeArgs),
    /// List registered plugins
    Plugin(PluginArgs),
}

impl Cli {
    /// Load configuration from `--config` or the project layering.
    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(),
        }
    }
}

/// Open the configured engine with the built-in plugins.
pub async fn open_engine(config: &Config) -> Result<RuleEngine> {
    RuleEngine::open(config, PluginRegistry::with_builtins()).await
}

/// Print an error in the selected output mode and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", console::style("Error:").red().bold());
    }
    std::process::exit(1);
}
