//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{CheckCommandHandler, PingCommandHandler, PrintConfigCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::AutoconfigResult;

/// Execute the parsed command with the merged settings
pub async fn execute_command(cli: &Cli, settings: Settings) -> AutoconfigResult<()> {
    match cli.resolved_command() {
        Commands::Check => CheckCommandHandler::new(settings).execute(),
        Commands::PrintConfig { format } => PrintConfigCommandHandler::new(settings).execute(format),
        Commands::Ping => PingCommandHandler::new(settings).execute().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn create_valid_config() -> Settings {
        let mut config = Settings::default();
        config.redis.single.address = "redis://127.0.0.1:6379".to_string();
        config
    }

    #[tokio::test]
    async fn test_execute_default_check() {
        let cli = Cli::try_parse_from(["redis-autoconfigure"]).unwrap();
        let result = execute_command(&cli, create_valid_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_execute_print_config() {
        let cli =
            Cli::try_parse_from(["redis-autoconfigure", "print-config", "--format", "yaml"]).unwrap();
        let result = execute_command(&cli, create_valid_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_execute_check_invalid_config() {
        let cli = Cli::try_parse_from(["redis-autoconfigure", "check"]).unwrap();
        let mut config = create_valid_config();
        config.redis.single.address = "127.0.0.1".to_string();
        let result = execute_command(&cli, config).await;
        assert!(result.is_err());
    }
}
