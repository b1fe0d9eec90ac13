//! Bridge configuration with validation.

use crate::domain::chain::ChainDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Chain the provider starts on
    pub default_chain: ChainDescriptor,
    /// Flags announced on the provider object
    pub provider: ProviderFlags,
    /// Durable storage behaviour
    pub storage: StorageConfig,
}

impl BridgeConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_chain.chain_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_chain.chainId cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Announcement flags of the injected provider object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderFlags {
    /// Announce as MetaMask (`isMetaMask`)
    pub is_metamask: bool,
    /// `_metamask.isUnlocked`
    pub is_unlocked: bool,
    /// `_metamask.isEnabled`
    pub is_enabled: bool,
    /// `_metamask.isApproved`
    pub is_approved: bool,
}

impl Default for ProviderFlags {
    fn default() -> Self {
        Self {
            is_metamask: true,
            is_unlocked: true,
            is_enabled: true,
            is_approved: true,
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Write connection markers when an account is selected
    pub persist_connection_markers: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persist_connection_markers: true,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },
    /// Config text is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Values parsed but are not usable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
