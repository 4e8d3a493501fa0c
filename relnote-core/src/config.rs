//! Configuration management for relnote
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (RELNOTE_*)
//! 3. Config file (~/.config/relnote/config.toml)
//! 4. Default values

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Model-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier for the Anthropic Messages API
    pub model: String,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// Extended-thinking token budget; 0 disables thinking
    pub thinking_budget: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "claude-opus-4-5".to_string(),
            max_tokens: 16_000,
            thinking_budget: 10_000,
        }
    }
}

/// Run-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Days to look back on a first run with no persisted state
    pub lookback_days: i64,

    /// Override for the run-state file location
    pub state_path: Option<PathBuf>,

    /// Additional attempts per pipeline stage after the first failure
    pub stage_retries: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            state_path: None,
            stage_retries: 2,
        }
    }
}

/// Customer meeting-notes configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MeetingsConfig {
    /// Path to the local meeting-notes cache file
    pub cache_path: Option<PathBuf>,

    /// Customer name -> folder search terms
    ///
    /// Keys are matched case-insensitively against the customer argument;
    /// values are substrings searched for in folder titles.
    pub aliases: HashMap<String, Vec<String>>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub model: ModelConfig,

    /// Run configuration
    pub run: RunConfig,

    /// Customer meetings configuration
    pub meetings: MeetingsConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/relnote/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("relnote").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - RELNOTE_MODEL: Model identifier
    /// - RELNOTE_LOOKBACK_DAYS: First-run lookback window in days
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("RELNOTE_MODEL") {
            self.model.model = model;
        }

        if let Ok(days) = std::env::var("RELNOTE_LOOKBACK_DAYS") {
            if let Ok(days) = days.parse() {
                self.run.lookback_days = days;
            }
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, model: Option<String>) -> Self {
        if let Some(m) = model {
            self.model.model = m;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(model: Option<String>) -> Result<Self> {
        Ok(Self::load()?.with_env_overrides().with_cli_overrides(model))
    }

    /// Folder search terms for a customer name
    ///
    /// Falls back to the lowercased name itself when no alias is configured.
    pub fn customer_search_terms(&self, customer: &str) -> Vec<String> {
        let key = customer.trim().to_lowercase();
        match self.meetings.aliases.get(&key) {
            Some(terms) if !terms.is_empty() => terms.clone(),
            _ => vec![key],
        }
    }
}
