//! `event-rules run`: tick on an interval until Ctrl-C.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::open_engine;
use crate::cli::output::{output, ActionOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Seconds between ticks (defaults to scheduler.tick_interval_secs)
    #[arg(long)]
    pub interval: Option<u64>,
}

pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = open_engine(config).await?;
    let interval = Duration::from_secs(args.interval.unwrap_or(config.scheduler.tick_interval_secs).max(1));

    let scheduler = engine.scheduler();
    let handle = scheduler.start(interval);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    scheduler.stop();
    handle.abort();
    // JoinError::Cancelled is expected.
    let _ = handle.await;

    output(&ActionOutput::ok("Scheduler stopped"), json_mode);
    Ok(())
}
