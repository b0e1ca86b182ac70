//! Settings validation
//!
//! Only the logger section is checked here. Client properties are validated
//! while the client configuration is built, so that a topology group which
//! is not selected can never fail startup.

use crate::config::error::ConfigError;
use crate::config::settings::{LoggerSettings, Settings};

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl Settings {
    /// Validate the loaded settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logger.validate()?;
        self.validate_cache_configs()
    }

    fn validate_cache_configs(&self) -> Result<(), ConfigError> {
        for name in self.redis.cache_manager.configs.keys() {
            if name.trim().is_empty() {
                return Err(ConfigError::validation(
                    "redis.cache_manager.configs",
                    "Cache names must not be blank.",
                ));
            }
        }
        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Level must not be empty
    /// - File format must be one of full, compact, json
    /// - File path must not be empty when file output is enabled
    /// - At least one output must be enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.level",
                "Log level must not be empty.",
            ));
        }

        let format = self.file.format.to_lowercase();
        if !VALID_LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "Log file path is required when file output is enabled.",
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        Ok(())
    }
}
