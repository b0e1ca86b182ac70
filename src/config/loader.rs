//! Configuration loader
//!
//! Binds external key-value configuration into [`Settings`].
//!
//! # Sources (lowest to highest priority)
//! 1. `{dir}/application.{toml,yaml,yml,json}` (optional)
//! 2. `{dir}/application-{profile}.{toml,yaml,yml,json}` (optional)
//! 3. `APP_*` environment variables, `__` separating nested keys
//!
//! When a single file is given (`APP_CONFIG_FILE` or [`ConfigLoader::with_config_file`])
//! it replaces layers 1 and 2 and must exist.
//!
//! Keys may be written in kebab-case (`node-addresses`) or snake_case
//! (`node_addresses`); both bind to the same property. Entries under a
//! `configs` table are cache names and keep their spelling.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, Map, Source, Value, ValueKind};
use tracing::debug;

use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable naming the configuration directory
const CONFIG_DIR_ENV: &str = "APP_CONFIG_DIR";

/// Environment variable naming a single configuration file
const CONFIG_FILE_ENV: &str = "APP_CONFIG_FILE";

/// Environment variable naming the active profile
const PROFILE_ENV: &str = "APP_PROFILE";

const DEFAULT_CONFIG_DIR: &str = "config";

/// Base name of the layered configuration files
const BASE_NAME: &str = "application";

const ENV_PREFIX: &str = "APP";

const ENV_SEPARATOR: &str = "__";

/// Keys whose environment values are comma separated lists
const LIST_KEYS: &[&str] = &[
    "redis.cluster.node_addresses",
    "redis.replicated.node_addresses",
    "redis.master_slave.slave_addresses",
    "redis.sentinel.sentinel_addresses",
];

/// Layered configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    config_file: Option<PathBuf>,
    profile: Option<String>,
    use_environment: bool,
}

impl ConfigLoader {
    /// Create a loader from `APP_CONFIG_DIR`, `APP_CONFIG_FILE` and `APP_PROFILE`
    pub fn new() -> Self {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        let config_file = std::env::var(CONFIG_FILE_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let profile = std::env::var(PROFILE_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self {
            config_dir,
            config_file,
            profile,
            use_environment: true,
        }
    }

    /// Load a single file instead of the layered directory
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Ignore `APP_*` environment variables
    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load, bind and validate settings from all sources
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings = bind(config)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Bind settings from in-memory content
    pub fn load_from_str(content: &str, format: FileFormat) -> Result<Settings, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(content, format))
            .build()?;
        let settings = bind(config)?;
        settings.validate()?;
        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match self.config_file {
            Some(ref file) => {
                if !file.exists() {
                    return Err(ConfigError::file_not_found(file.display().to_string()));
                }
                debug!(file = %file.display(), "loading single configuration file");
                builder.add_source(File::from(file.as_path()).required(true))
            }
            None => self.add_layered_sources(builder),
        };

        let builder = if self.use_environment {
            Self::add_env_source(builder)
        } else {
            builder
        };

        builder.build().map_err(ConfigError::from)
    }

    fn add_layered_sources(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> ConfigBuilder<DefaultState> {
        let base = self.config_dir.join(BASE_NAME);
        debug!(base = %base.display(), profile = ?self.profile, "loading layered configuration");
        let builder = builder.add_source(File::with_name(&base.to_string_lossy()).required(false));

        match self.profile {
            Some(ref profile) => {
                let overlay = self.config_dir.join(format!("{}-{}", BASE_NAME, profile));
                builder.add_source(File::with_name(&overlay.to_string_lossy()).required(false))
            }
            None => builder,
        }
    }

    /// `APP_REDIS__SINGLE__ADDRESS` -> `redis.single.address`
    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        let env = LIST_KEYS.iter().fold(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true)
                .list_separator(","),
            |env, key| env.with_list_parse_key(key),
        );
        builder.add_source(env)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Table whose keys are user-chosen names rather than property names
const VERBATIM_TABLE: &str = "configs";

fn bind(config: Config) -> Result<Settings, ConfigError> {
    let root = normalize_table(config.collect()?, false);
    Value::new(None, ValueKind::Table(root))
        .try_deserialize::<Settings>()
        .map_err(|e| ConfigError::Binding(e.to_string()))
}

/// Rewrite `-` to `_` in property names
///
/// Snake_case spellings are inserted first, so on a clash between two
/// scalar values the snake_case one is kept. Clashing tables are merged.
pub(crate) fn normalize_table(table: Map<String, Value>, verbatim: bool) -> Map<String, Value> {
    let (plain, dashed): (Vec<_>, Vec<_>) =
        table.into_iter().partition(|(key, _)| !key.contains('-'));

    let mut normalized = Map::new();
    for (key, value) in plain.into_iter().chain(dashed) {
        let key = if verbatim { key } else { key.replace('-', "_") };
        let value = normalize_value(value, !verbatim && key == VERBATIM_TABLE);
        match normalized.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                normalized.insert(key, value);
            }
        }
    }
    normalized
}

fn normalize_value(value: Value, verbatim: bool) -> Value {
    let origin = value.origin().map(str::to_string);
    match value.kind {
        ValueKind::Table(table) => {
            let table = if verbatim {
                table
                    .into_iter()
                    .map(|(name, entry)| (name, normalize_value(entry, false)))
                    .collect()
            } else {
                normalize_table(table, false)
            };
            Value::new(origin.as_ref(), ValueKind::Table(table))
        }
        kind => Value::new(origin.as_ref(), kind),
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    let ValueKind::Table(target) = &mut existing.kind else {
        return;
    };
    let ValueKind::Table(source) = incoming.kind else {
        return;
    };
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(current) => merge_value(current, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}
