//! Implementation of the `event-rules init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use crate::adapters::sqlite::{initialize_database, PoolConfig};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::{ConfigLoader, CONFIG_DIR};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_path: PathBuf,
    pub config_written: bool,
    pub database_path: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!("Wrote {}", self.config_path.display()));
        }
        lines.push(format!("Database ready at {}", self.database_path.display()));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let target = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let config_dir = target.join(CONFIG_DIR);
    fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    let config_path = config_dir.join("config.yaml");
    let config_written = args.force || !config_path.exists();
    if config_written {
        fs::write(&config_path, ConfigLoader::default_yaml()?)
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
    }

    let database_path = {
        let configured = PathBuf::from(&config.database.path);
        if configured.is_absolute() {
            configured
        } else {
            target.join(configured)
        }
    };
    let url = format!("sqlite:{}", database_path.display());
    let pool = initialize_database(&url, Some(PoolConfig::from(&config.database)))
        .await
        .context("Failed to initialize database")?;
    pool.close().await;

    tracing::info!(path = %target.display(), "Initialized project");
    output(
        &InitOutput {
            success: true,
            message: format!("Initialized event rules in {}", target.display()),
            config_path,
            config_written,
            database_path,
        },
        json_mode,
    );
    Ok(())
}
