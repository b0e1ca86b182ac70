//! Configuration merger for CLI arguments and config files
//!
//! Loads [`Settings`] through the layered loader and applies the overrides
//! given on the command line. CLI arguments win over every file and
//! environment value.

use super::parser::Cli;
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

/// Applies CLI overrides on top of file-based configuration
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load through `loader`, narrowed by `--config` and `--profile`
    pub fn load(cli: &Cli, loader: ConfigLoader) -> Result<Self, ConfigError> {
        let loader = match cli.config {
            Some(ref path) => loader.with_config_file(path),
            None => loader,
        };
        let loader = match cli.profile {
            Some(ref profile) => loader.with_profile(profile),
            None => loader,
        };
        Ok(Self::new(loader.load()?))
    }

    /// Apply --verbose / --quiet and re-validate
    pub fn merge_cli_args(self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config;

        if let Some(level) = cli.log_level_override() {
            config.logger.level = level.to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn base_config(&self) -> &Settings {
        &self.base_config
    }
}
