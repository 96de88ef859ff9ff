//! Configuration.
//!
//! Config file: ~/.config/tabcat/config.toml. Every field has a default
//! and the file is optional. The API key comes from the environment
//! (`GEMINI_API_KEY`), never from the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::csv::encode::EncodeBudget;
use crate::gateway::{GatewayConfig, RetryPolicy};

/// Model and endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier sent to the remote service.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the generateContent API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bounded request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Category suggestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestConfig {
    /// How many labels the model should infer (the fallback comes on top).
    #[serde(default = "default_inferred")]
    pub inferred: usize,

    /// The catch-all label, always the last line of a suggestion and the
    /// last entry of a vocabulary.
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_inferred() -> usize {
    5
}

fn default_fallback() -> String {
    "Unknown".to_string()
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            inferred: default_inferred(),
            fallback: default_fallback(),
        }
    }
}

/// Prompt size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    #[serde(default = "default_max_payload_chars")]
    pub max_payload_chars: usize,
}

fn default_max_rows() -> usize {
    2_000
}

fn default_max_payload_chars() -> usize {
    200_000
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            max_payload_chars: default_max_payload_chars(),
        }
    }
}

/// Retry settings. Off by default; retries apply to timeouts only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub timeout_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_base_delay_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout_retries: 0,
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabcatConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub suggest: SuggestConfig,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl TabcatConfig {
    /// Load from the default config path, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tabcat").join("config.toml"))
    }

    pub fn budget(&self) -> EncodeBudget {
        EncodeBudget {
            max_rows: self.budget.max_rows,
            max_chars: self.budget.max_payload_chars,
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            model: self.model.model.clone(),
            endpoint: self.model.endpoint.clone(),
            timeout_secs: self.model.timeout_secs,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.timeout_retries,
            base_delay_ms: self.retry.base_delay_ms,
        }
    }
}
