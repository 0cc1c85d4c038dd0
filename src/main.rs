use anyhow::Result;
use clap::{Parser, Subcommand};
use fxconv::core::log::init_logging;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert amounts interactively (default)
    Convert,
    /// Display the current exchange rates
    Rates,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxconv::cli::setup::setup(),
        Some(Commands::Rates) => {
            fxconv::run_command(fxconv::AppCommand::Rates, cli.config_path.as_deref()).await
        }
        Some(Commands::Convert) | None => {
            fxconv::run_command(fxconv::AppCommand::Convert, cli.config_path.as_deref()).await
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // Already shown to the user as a status message
        Err(e) if fxconv::is_reported(&e) => {
            tracing::debug!(error = %e, "Session ended without data");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            tracing::error!(error = %e, "Application failed");
            Err(e)
        }
    }
}
