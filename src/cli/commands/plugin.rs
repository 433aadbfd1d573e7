//! Plugin listing command.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::display::{colorize_component_type, list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::services::{PluginDefinition, PluginRegistry};

#[derive(Args, Debug)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommands,
}

#[derive(Subcommand, Debug)]
pub enum PluginCommands {
    /// List registered condition and action plugins
    List,
}

#[derive(Debug, serde::Serialize)]
pub struct PluginListOutput {
    pub plugins: Vec<PluginDefinition>,
    pub total: usize,
}

impl CommandOutput for PluginListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "type", "label"]);
        for plugin in &self.plugins {
            table.add_row(vec![
                plugin.id.clone(),
                colorize_component_type(plugin.component_type.as_str()).to_string(),
                plugin.label.clone(),
            ]);
        }
        render_list("plugin", &table, self.total)
    }
}

pub fn execute(args: &PluginArgs, plugins: &PluginRegistry, json_mode: bool) -> Result<()> {
    match args.command {
        PluginCommands::List => {
            let definitions = plugins.definitions();
            output(
                &PluginListOutput {
                    total: definitions.len(),
                    plugins: definitions,
                },
                json_mode,
            );
        }
    }
    Ok(())
}
