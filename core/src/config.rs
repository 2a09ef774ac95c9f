//! Configuration loading
//!
//! Layers, lowest priority first:
//! 1. Built-in defaults
//! 2. `helena.toml` in the working directory, or the file named by
//!    `HELENA_CONFIG_PATH` / `--config`
//! 3. `HELENA_*` environment variables (`__` separates nested keys, e.g.
//!    `HELENA_PROCESS__CAPTURE_ERROR_STACK=true`)
//!
//! A `.env` file is loaded into the environment first, if present.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interpreter::ProcessOptions;

const DEFAULT_CONFIG_FILE: &str = "helena.toml";
const CONFIG_PATH_VAR: &str = "HELENA_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub process: ProcessConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Attach error stacks to ERROR results
    pub capture_error_stack: bool,
    /// Source name recorded in error-stack frames for inline scripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_PATH_VAR).ok();
        Self::load_from(path.as_deref())
    }

    /// Load configuration, reading `path` instead of `helena.toml` when given
    pub fn load_from(path: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let mut builder = config::Config::builder()
            .set_default("process.capture_error_stack", defaults.process.capture_error_stack)?
            .set_default("log.filter", defaults.log.filter)?;

        builder = match path {
            Some(path) => {
                if !Path::new(path).exists() {
                    return Err(ConfigError::NotFound(path.to_string()));
                }
                builder.add_source(config::File::with_name(path).required(true))
            }
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix("HELENA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            capture_error_stack: self.process.capture_error_stack,
        }
    }
}
