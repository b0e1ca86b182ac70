//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output with color control
//! - File output in Full, Compact or JSON format
//! - Fallback to stderr when the log file cannot be written

pub mod config;
pub mod error;
pub(crate) mod writer;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing_subscriber::{Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use writer::LogFileWriter;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber
///
/// Fails with [`LoggerError::Init`] when a subscriber is already installed.
pub fn init_logger(config: &LoggerConfig) -> Result<(), LoggerError> {
    config.validate()?;
    let filter = config.env_filter()?;

    tracing_subscriber::registry()
        .with(build_layers(config)?)
        .with(filter)
        .try_init()
        .map_err(|e| LoggerError::init(e.to_string()))
}

/// Output layers; the file layer comes first so console ANSI codes never
/// reach the file
fn build_layers(config: &LoggerConfig) -> Result<Vec<BoxedLayer>, LoggerError> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.file.enabled {
        let writer = LogFileWriter::new(&config.file)?;
        layers.push(match config.file.format {
            LogFormat::Full => fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .compact()
                .with_writer(writer)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .with_ansi(false)
                .json()
                .with_writer(writer)
                .boxed(),
        });
    }

    if config.console.enabled {
        let use_ansi = config.console.colored && std::io::stdout().is_terminal();
        layers.push(
            fmt::layer()
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true)
                .boxed(),
        );
    }

    Ok(layers)
}
