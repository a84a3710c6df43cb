//! Layered settings
//!
//! Priority, high to low:
//! 1. `WIND_*` environment variables (`WIND_COMPILER__BINDER`, ...)
//! 2. the TOML file given by `config_path`, else `wind.toml` if present
//! 3. built-in defaults
//!
//! A `.env` file is loaded into the environment first.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_BINDER: &str = "$await";
pub const DEFAULT_BUILDER_ROOT: &str = "Wind.builders";
pub const DEFAULT_UNOBSERVED_TIMEOUT_MS: u64 = 1000;
const DEFAULT_FILE: &str = "wind";
const DEFAULT_ENV_PREFIX: &str = "WIND";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub compiler: CompilerSettings,
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerSettings {
    /// Identifier whose calls mark bind points
    #[serde(default = "default_binder")]
    pub binder: String,
    /// Expression the emitted source resolves builders from
    #[serde(default = "default_builder_root")]
    pub builder_root: String,
}

fn default_binder() -> String {
    DEFAULT_BINDER.to_string()
}

fn default_builder_root() -> String {
    DEFAULT_BUILDER_ROOT.to_string()
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            binder: default_binder(),
            builder_root: default_builder_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// How long a failed task may stay unobserved before it is reported
    #[serde(default = "default_unobserved_timeout_ms")]
    pub unobserved_timeout_ms: u64,
}

fn default_unobserved_timeout_ms() -> u64 {
    DEFAULT_UNOBSERVED_TIMEOUT_MS
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            unobserved_timeout_ms: DEFAULT_UNOBSERVED_TIMEOUT_MS,
        }
    }
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Load with the default search path and environment prefix
    pub fn load() -> Result<Settings> {
        Settings::builder().build()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings")
    }
}

pub struct SettingsBuilder {
    config_path: Option<PathBuf>,
    env_prefix: String,
    dotenv: bool,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            config_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            dotenv: true,
        }
    }
}

impl SettingsBuilder {
    /// Use this file instead of searching for `wind.toml`. The file must exist.
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Whether to load `.env` before reading the environment
    pub fn dotenv(mut self, enabled: bool) -> Self {
        self.dotenv = enabled;
        self
    }

    pub fn build(self) -> Result<Settings> {
        if self.dotenv {
            dotenvy::dotenv().ok();
        }

        let mut builder = Config::builder()
            .set_default("compiler.binder", DEFAULT_BINDER)?
            .set_default("compiler.builder_root", DEFAULT_BUILDER_ROOT)?
            .set_default("runtime.unobserved_timeout_ms", DEFAULT_UNOBSERVED_TIMEOUT_MS)?;

        builder = match &self.config_path {
            Some(path) => builder.add_source(File::from(path.as_path()).format(FileFormat::Toml)),
            None => builder.add_source(
                File::with_name(DEFAULT_FILE)
                    .format(FileFormat::Toml)
                    .required(false),
            ),
        };

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        info!(
            binder = %settings.compiler.binder,
            unobserved_timeout_ms = settings.runtime.unobserved_timeout_ms,
            "settings loaded"
        );
        Ok(settings)
    }
}
