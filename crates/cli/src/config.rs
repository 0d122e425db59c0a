//! Configuration loading from splitter.toml.

use contract::Contract;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use transport::{BuildError, HttpTransport};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Remote service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Wire contract; omitted endpoints keep the current revision.
    #[serde(default)]
    pub contract: Contract,
}

/// Remote service configuration.
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    /// Base URL the contract paths are joined to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout. No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

impl ServiceConfig {
    /// Build the HTTP transport for this service.
    pub fn transport(&self) -> Result<HttpTransport, BuildError> {
        let mut builder = HttpTransport::builder(&self.base_url);
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load the file if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.contract.validate()?;
        if config.service.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "service.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Contract(#[from] contract::Error),
}
