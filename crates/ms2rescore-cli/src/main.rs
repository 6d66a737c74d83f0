mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands, LogLevel};
use crate::error::{CliError, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();

    let cascade = config::build_cascade(&cli.command)?;
    let configuration = cascade.parse()?;

    let configured_level = LogLevel::from_name(&configuration.ms2rescore.log_level);
    let level = cli
        .log_level
        .or(configured_level)
        .unwrap_or(LogLevel::Info);
    logging::setup_logging(level, cli.quiet, cli.log_file.clone())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("MS²Rescore v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);
    if cli.log_level.is_none() && configured_level.is_none() {
        warn!(
            "Unknown log_level '{}' in configuration; using {:?}.",
            configuration.ms2rescore.log_level, level
        );
    }

    let command_result = match cli.command {
        Commands::Run(_) => {
            info!("Dispatching to 'run' command.");
            commands::run::run(configuration).await
        }
        Commands::Config(args) => {
            info!("Dispatching to 'config' command.");
            commands::config::run(configuration, args).await
        }
        Commands::CheckTools(_) => {
            info!("Dispatching to 'check-tools' command.");
            commands::tools::run(configuration).await
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }

    command_result
}
