//! Event Rules CLI entry point.

use clap::Parser;

use event_rules::cli::{commands, handle_error, Cli, Commands};
use event_rules::infrastructure::logging::{LogConfig, LoggerImpl};
use event_rules::services::PluginRegistry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(err) => handle_error(&err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(&err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &config, cli.json).await,
        Commands::Tick(args) => commands::tick::execute(args, &config, cli.json).await,
        Commands::Run(args) => commands::run::execute(args, &config, cli.json).await,
        Commands::Rule(args) => commands::rule::execute(args, &config, cli.json).await,
        Commands::Schedule(args) => commands::schedule::execute(args, &config, cli.json).await,
        Commands::EventType(args) => commands::event_type::execute(args, &config, cli.json).await,
        Commands::Plugin(args) => {
            commands::plugin::execute(&args, &PluginRegistry::with_builtins(), cli.json)
        }
    };

    if let Err(err) = result {
        handle_error(&err, cli.json);
    }
}
