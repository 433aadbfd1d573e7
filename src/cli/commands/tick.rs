//! `event-rules tick`: one cron pass of the scheduler.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;

use crate::cli::open_engine;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::services::TickReport;

#[derive(Args, Debug)]
pub struct TickArgs {
    /// Evaluate due schedules as of this RFC 3339 time instead of now
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, serde::Serialize)]
pub struct TickOutput {
    pub now: DateTime<Utc>,
    #[serde(flatten)]
    pub report: TickReport,
    pub queue_pending: u64,
}

impl CommandOutput for TickOutput {
    fn to_human(&self) -> String {
        format!(
            "Tick at {}: {} queued, {} skipped, {} enqueue failure(s), {} expired removed ({} item(s) pending in queue)",
            self.now.to_rfc3339(),
            self.report.queued,
            self.report.skipped,
            self.report.enqueue_failures,
            self.report.expired,
            self.queue_pending,
        )
    }
}

pub async fn execute(args: TickArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = open_engine(config).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let report = engine.scheduler().tick(now).await?;
    let queue_pending = engine.queue().pending_count(&config.scheduler.queue_name).await?;

    output(
        &TickOutput {
            now,
            report,
            queue_pending,
        },
        json_mode,
    );
    Ok(())
}
