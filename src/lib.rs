pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use anyhow::Result;
use tracing::{debug, info};

pub use crate::cli::convert::is_reported;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Convert,
    Rates,
}

fn load_config(config_path: Option<&str>) -> Result<crate::core::config::AppConfig> {
    let config = match config_path {
        Some(path) => crate::core::config::AppConfig::load_from_path(path)?,
        None => crate::core::config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!(?command, "fxconv starting...");
    let config = load_config(config_path)?;

    match command {
        AppCommand::Convert => cli::convert::run(&config).await,
        AppCommand::Rates => cli::rates::run(&config).await,
    }
}
