//! Root configuration structures
//!
//! `Settings` is what the loader deserializes: the `[redis]` section consumed
//! by the autoconfiguration and the `[logger]` section consumed by the binary.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::config::redis::RedisProperties;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/redis-autoconfigure.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// "full", "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
        }
    }
}

/// `[logger]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Level or full `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime `LoggerConfig`
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format".to_string(), e.to_string()))?;

        let config = LoggerConfig {
            level: self.level,
            console: ConsoleConfig {
                enabled: self.console.enabled,
                colored: self.console.colored,
            },
            file: FileConfig {
                enabled: self.file.enabled,
                path: PathBuf::from(self.file.path),
                append: self.file.append,
                format,
            },
        };

        config
            .validate()
            .map_err(|e| ConfigError::validation("logger".to_string(), e.to_string()))?;
        Ok(config)
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete settings tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub redis: RedisProperties,

    #[serde(default)]
    pub logger: LoggerSettings,
}
