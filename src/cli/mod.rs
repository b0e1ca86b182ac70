//! CLI module for redis-autoconfigure
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing with clap
//! - Configuration merging (CLI args + config files)
//! - Command handlers for check, print-config and ping

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, OutputFormat};

use crate::config::ConfigLoader;
use crate::config::settings::Settings;
use crate::error::AutoconfigResult;
use crate::logger::init_logger;

/// Load configuration and apply CLI overrides
pub fn load_and_merge_config(cli: &Cli) -> AutoconfigResult<Settings> {
    let merger = ConfigurationMerger::load(cli, ConfigLoader::new())?;
    Ok(merger.merge_cli_args(cli)?)
}

/// Initialize logging from the `[logger]` section
pub fn init_logger_from_settings(settings: &Settings) -> AutoconfigResult<()> {
    let logger_config = settings.logger.clone().into_logger_config()?;
    init_logger(&logger_config)?;
    Ok(())
}
