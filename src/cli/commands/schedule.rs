//! Schedule and queue inspection commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;

use crate::cli::display::{list_table, render_list};
use crate::cli::open_engine;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Schedule, ATTEMPTS_MAX};

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommands,
}

#[derive(Subcommand, Debug)]
pub enum ScheduleCommands {
    /// List all schedules
    List,
    /// Show how many items wait in the work queue
    Queue,
}

#[derive(Debug, serde::Serialize)]
pub struct ScheduleOutput {
    pub id: String,
    pub component_id: String,
    pub trigger_date: String,
    pub in_queue: bool,
    pub attempts: u32,
}

impl From<&Schedule> for ScheduleOutput {
    fn from(schedule: &Schedule) -> Self {
        Self {
            id: schedule.id.to_string(),
            component_id: schedule.component_id.to_string(),
            trigger_date: schedule.trigger_date.to_rfc3339(),
            in_queue: schedule.in_queue,
            attempts: schedule.attempts,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ScheduleListOutput {
    pub schedules: Vec<ScheduleOutput>,
    pub total: usize,
}

impl CommandOutput for ScheduleListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "component", "trigger date", "queued", "attempts"]);
        for schedule in &self.schedules {
            let attempts = format!("{}/{ATTEMPTS_MAX}", schedule.attempts);
            table.add_row(vec![
                schedule.id.clone(),
                schedule.component_id.clone(),
                schedule.trigger_date.clone(),
                if schedule.in_queue { "yes" } else { "no" }.to_string(),
                if schedule.attempts > ATTEMPTS_MAX {
                    style(attempts).red().to_string()
                } else {
                    attempts
                },
            ]);
        }
        render_list("schedule", &table, self.total)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct QueueOutput {
    pub queue_name: String,
    pub pending: u64,
}

impl CommandOutput for QueueOutput {
    fn to_human(&self) -> String {
        format!("Queue '{}': {} pending item(s)", self.queue_name, self.pending)
    }
}

pub async fn execute(args: ScheduleArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = open_engine(config).await?;

    match args.command {
        ScheduleCommands::List => {
            let schedules = engine.list_schedules().await?;
            output(
                &ScheduleListOutput {
                    total: schedules.len(),
                    schedules: schedules.iter().map(ScheduleOutput::from).collect(),
                },
                json_mode,
            );
        }
        ScheduleCommands::Queue => {
            let queue_name = config.scheduler.queue_name.clone();
            let pending = engine.queue().pending_count(&queue_name).await?;
            output(&QueueOutput { queue_name, pending }, json_mode);
        }
    }

    Ok(())
}
