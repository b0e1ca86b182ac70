//! Print-config command handler

use crate::cli::parser::OutputFormat;
use crate::client::{ClientConfig, build_client_config};
use crate::config::settings::Settings;
use crate::error::{AutoconfigError, AutoconfigResult};

/// Handler for the print-config command
pub struct PrintConfigCommandHandler {
    config: Settings,
}

impl PrintConfigCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub fn execute(&self, format: OutputFormat) -> AutoconfigResult<()> {
        println!("{}", self.render(format)?);
        Ok(())
    }

    /// The built client configuration in `format`
    pub fn render(&self, format: OutputFormat) -> AutoconfigResult<String> {
        let client_config = build_client_config(&self.config.redis)?;
        render(&client_config, format)
    }
}

fn render(config: &ClientConfig, format: OutputFormat) -> AutoconfigResult<String> {
    let rendered = match format {
        OutputFormat::Json => config.to_json().map_err(|e| e.to_string()),
        OutputFormat::Yaml => config.to_yaml().map_err(|e| e.to_string()),
    };
    rendered.map_err(AutoconfigError::Serialization)
}
