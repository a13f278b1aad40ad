//! CLI configuration file support.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. Environment variables
//! 3. Local config file (./.tzrc)
//! 4. Global config file (~/.tensorzero/config.toml)
//! 5. Defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tz_client::{DEFAULT_GATEWAY_URL, GATEWAY_URL_ENV};
use tz_fine_tuning::OpenAIConfig;

/// CLI configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Gateway base URL
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,

    /// OpenAI API base URL used for fine-tuning
    #[serde(default)]
    pub openai_base_url: Option<String>,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output format configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format (human, json)
    #[serde(default = "default_output_format")]
    pub format: String,
}

fn default_output_format() -> String {
    "human".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: default_output_format() }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),
}

pub type CliConfigResult<T> = std::result::Result<T, CliConfigError>;

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> CliConfigResult<Self> {
        if !path.exists() {
            return Err(CliConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| CliConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".tensorzero")
            .join("config.toml")
    }

    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".tzrc")
    }

    /// Loads the global config, then the local one on top of it.
    ///
    /// Missing files are skipped; unreadable ones are reported and skipped.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();
        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(found) => config.merge(&found),
                Err(CliConfigError::NotFound(_)) => {}
                Err(e) => eprintln!("Warning: {e}"),
            }
        }
        config
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref gateway_url) = other.gateway_url {
            self.gateway_url = Some(gateway_url.clone());
        }
        if let Some(ref log_level) = other.log_level {
            self.log_level = Some(log_level.clone());
        }
        if let Some(ref openai_base_url) = other.openai_base_url {
            self.openai_base_url = Some(openai_base_url.clone());
        }
        if other.output.format != "human" {
            self.output.format = other.output.format.clone();
        }
    }

    pub fn wants_json(&self) -> bool {
        self.output.format.eq_ignore_ascii_case("json")
    }

    /// Gateway URL from the flag, the environment, this config, or the default, in that order.
    pub fn resolve_gateway_url(&self, flag: Option<String>) -> String {
        first_set([flag, non_empty_env(GATEWAY_URL_ENV), self.gateway_url.clone()])
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string())
    }

    /// OpenAI settings from the environment, with the config's base URL as fallback.
    pub fn openai_config(&self) -> OpenAIConfig {
        let config = OpenAIConfig::from_env();
        match (non_empty_env("OPENAI_BASE_URL"), &self.openai_base_url) {
            (None, Some(base_url)) => config.with_base_url(base_url.clone()),
            _ => config,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn first_set<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|value| !value.trim().is_empty())
}

/// Load and merge CLI configuration.
pub fn load_config() -> CliConfig {
    CliConfig::discover_and_load()
}
