//! Configuration for Gymchat
//!
//! Settings come from an optional TOML file merged with environment
//! variables. Credentials are only ever read from the environment and
//! are checked once at startup, before any conversation starts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::orchestration::OrchestratorConfig;
use crate::tools::api::DEFAULT_BASE_URL;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model backend settings
    pub model: ModelConfig,
    /// Fitness data provider settings
    pub fitness_api: FitnessApiConfig,
    /// Orchestration loop settings
    pub loop_settings: LoopConfig,
    /// External tool server command; when unset, `gymchat serve` is
    /// spawned from the current executable
    pub server_command: Option<Vec<String>>,
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model id (provider is inferred from it)
    pub model: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// System prompt override
    pub system_prompt: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            system_prompt: None,
        }
    }
}

/// Fitness data provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessApiConfig {
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for FitnessApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "RAPID_APIKEY".to_string(),
        }
    }
}

/// Orchestration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub max_iterations: usize,
    pub backend_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            max_iterations: defaults.max_iterations,
            backend_attempts: defaults.backend_attempts,
            retry_base_delay_ms: defaults.retry_base_delay.as_millis() as u64,
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/gymchat/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("gymchat").join("config.toml"))
    }

    /// Load from an explicit path, or the default location, falling
    /// back to defaults when no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        match path {
            Some(p) if p.exists() => {
                debug!(path = %p.display(), "Loading config file");
                let raw = std::fs::read_to_string(&p)?;
                toml::from_str(&raw)
                    .map_err(|e| Error::Config(format!("invalid config file {}: {}", p.display(), e)))
            }
            _ => Ok(Self::default()),
        }
    }

    /// Orchestrator settings from the loop section
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_iterations: self.loop_settings.max_iterations,
            backend_attempts: self.loop_settings.backend_attempts,
            retry_base_delay: std::time::Duration::from_millis(self.loop_settings.retry_base_delay_ms),
        }
    }

    /// API key for the model backend, from the environment
    pub fn model_api_key(&self) -> Result<String> {
        read_env_key(&self.model.api_key_env)
    }

    /// API key for the fitness data provider, from the environment
    pub fn fitness_api_key(&self) -> Result<String> {
        read_env_key(&self.fitness_api.api_key_env)
    }

    /// Fail fast when required credentials are missing
    ///
    /// Called once before the first conversation; a failure here is
    /// fatal for the process.
    pub fn validate_for_chat(&self) -> Result<()> {
        self.model_api_key()?;
        Ok(())
    }

    pub fn validate_for_serve(&self) -> Result<()> {
        self.fitness_api_key()?;
        Ok(())
    }
}

fn read_env_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Config(format!(
            "environment variable {} is not set",
            var
        ))),
    }
}
