//! Chain configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file yields a
//! mainnet producer:
//!
//! ```toml
//! [producer]
//! execution_timeout_ms = 10000
//! privileged_senders = ["null", "steemsc", "steem-peg"]
//!
//! [protocol]
//! pending_unstakes_from_height = 32713424
//! inflation_from_height = 38145385
//! inflation_interval = 1200
//! nft_undelegations_from_height = 38145385
//! ```
//!
//! `SIDECHAIN_EXECUTION_TIMEOUT_MS` overrides the execution timeout.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{ProtocolError, ProtocolParams};

/// Environment variable overriding `producer.execution_timeout_ms`
pub const EXECUTION_TIMEOUT_ENV: &str = "SIDECHAIN_EXECUTION_TIMEOUT_MS";

pub const DEFAULT_EXECUTION_TIMEOUT_MS: u64 = 10_000;

/// Senders allowed to deploy and update contracts
pub const DEFAULT_PRIVILEGED_SENDERS: [&str; 3] = ["null", "steemsc", "steem-peg"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("execution_timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("privileged_senders must not be empty")]
    NoPrivilegedSenders,

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("protocol parameters: {0}")]
    Protocol(#[from] ProtocolError),
}

fn default_execution_timeout_ms() -> u64 {
    DEFAULT_EXECUTION_TIMEOUT_MS
}

fn default_privileged_senders() -> Vec<String> {
    DEFAULT_PRIVILEGED_SENDERS.iter().map(|s| s.to_string()).collect()
}

/// Block producer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Per-transaction contract time budget
    #[serde(default = "default_execution_timeout_ms")]
    pub execution_timeout_ms: u64,

    #[serde(default = "default_privileged_senders")]
    pub privileged_senders: Vec<String>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            execution_timeout_ms: default_execution_timeout_ms(),
            privileged_senders: default_privileged_senders(),
        }
    }
}

impl ProducerConfig {
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default)]
    pub protocol: ProtocolParams,
}

impl ChainConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ChainConfig = toml::from_str(content).context("failed to parse chain config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides(std::env::var(EXECUTION_TIMEOUT_ENV).ok().as_deref())?;
        tracing::info!(
            path = %path.display(),
            timeout_ms = config.producer.execution_timeout_ms,
            "loaded chain config"
        );
        Ok(config)
    }

    /// Apply the value of [`EXECUTION_TIMEOUT_ENV`], if set.
    pub fn apply_env_overrides(&mut self, timeout_ms: Option<&str>) -> Result<(), ConfigError> {
        if let Some(value) = timeout_ms {
            let parsed = value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                var: EXECUTION_TIMEOUT_ENV,
                value: value.to_string(),
            })?;
            self.producer.execution_timeout_ms = parsed;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.producer.execution_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.producer.privileged_senders.is_empty() {
            return Err(ConfigError::NoPrivilegedSenders);
        }
        self.protocol.validate()?;
        Ok(())
    }
}
