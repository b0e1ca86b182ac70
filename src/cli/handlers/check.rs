//! Check command handler
//!
//! Runs the autoconfiguration without connecting and prints the condition
//! report.

use crate::autoconfigure::{AutoConfiguration, ConditionReport};
use crate::config::settings::Settings;
use crate::error::AutoconfigResult;

/// Handler for the check command
pub struct CheckCommandHandler {
    config: Settings,
}

impl CheckCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Evaluate conditions, build matched components and print the report
    pub fn execute(&self) -> AutoconfigResult<()> {
        let report = self.evaluate()?;
        print!("{report}");
        println!("Configuration is valid");
        Ok(())
    }

    /// The registry is closed when this returns, shutting the client down
    pub fn evaluate(&self) -> AutoconfigResult<ConditionReport> {
        let (mut registry, report) = AutoConfiguration::new(self.config.redis.clone()).run()?;
        registry.close();
        Ok(report)
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
