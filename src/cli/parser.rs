//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// Include shadow-rs generated build information
use shadow_rs::shadow;
shadow!(build);

/// Inspect and exercise the Redis autoconfiguration
#[derive(Parser, Debug)]
#[command(name = "redis-autoconfigure")]
#[command(about = "Inspect and exercise the Redis autoconfiguration")]
#[command(long_about = "
redis-autoconfigure loads the layered application configuration, decides which
Redis components (client, cache manager, transaction manager) would be created,
and lets you inspect the resulting client configuration or reach the server.

EXAMPLES:
    # Show which components would be registered and why
    redis-autoconfigure check

    # Print the effective client configuration as YAML
    redis-autoconfigure print-config --format yaml

    # Use a specific configuration file
    redis-autoconfigure --config /etc/app/application.toml ping

    # Activate the 'prod' profile overlay (application-prod.toml)
    redis-autoconfigure --profile prod check
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single file instead of the layered config directory.
    /// TOML, YAML and JSON are recognised by extension.
    #[arg(short, long, value_name = "FILE", env = "APP_CONFIG_FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Active profile
    ///
    /// Overlays `application-{profile}.*` on top of the base configuration.
    #[arg(short, long, value_name = "NAME", env = "APP_PROFILE", value_parser = super::validation::validate_profile_name)]
    pub profile: Option<String>,

    /// Enable verbose logging
    ///
    /// Raises the log level to debug, which includes every condition outcome.
    /// Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Reduces log output to error level only.
    /// Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Evaluate the startup conditions and print the report (default)
    ///
    /// Builds the client configuration and every matched component without
    /// opening a connection. Exits non-zero when the configuration is invalid.
    Check,
    /// Print the effective client configuration
    ///
    /// Examples:
    ///   redis-autoconfigure print-config
    ///   redis-autoconfigure print-config --format yaml
    PrintConfig {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Build the client and send PING to the primary endpoint
    Ping,
}

/// Output format for print-config
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    #[value(name = "json")]
    Json,
    #[value(name = "yaml", alias = "yml")]
    Yaml,
}

impl Cli {
    /// Log level implied by --verbose / --quiet, if any
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }

    /// The subcommand to run, `check` when none was given
    pub fn resolved_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Check)
    }
}
