//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::ClientConfig;
use crate::error::Result;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from defaults, an optional file, and the environment.
    pub fn load(file: Option<&Path>) -> Result<ClientConfig> {
        let config = MergeService::load(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from inline TOML with environment overlay.
    pub fn load_from_str(toml: &str) -> Result<ClientConfig> {
        let config = MergeService::load_from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> ClientConfig {
        ClientConfig::default()
    }
}
