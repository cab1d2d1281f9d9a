//! Client configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `FILESHARE__*` environment variables (highest precedence).

mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::{Result, ShareError};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Upper bound the service accepts for a single listing page.
pub const SERVICE_MAX_PAGE_SIZE: u32 = 5000;

fn default_max_page_size() -> u32 {
    SERVICE_MAX_PAGE_SIZE
}

/// Directory listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Page-size hint used when a caller does not supply one
    #[serde(default)]
    pub default_page_size: Option<u32>,

    /// Hints above this value are clamped
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_page_size: None,
            max_page_size: default_max_page_size(),
        }
    }
}

impl ListingConfig {
    /// Effective page-size hint for a request. Zero is rejected before any round trip.
    pub fn resolve_page_size(&self, hint: Option<u32>) -> Result<Option<u32>> {
        match hint.or(self.default_page_size) {
            Some(0) => Err(ShareError::InvalidArgument(
                "page size hint must be greater than zero".to_string(),
            )),
            Some(n) => Ok(Some(n.min(self.max_page_size))),
            None => Ok(None),
        }
    }
}

/// Handle enumeration and closing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandleConfig {
    /// Include handles on descendants when the caller does not say otherwise
    #[serde(default)]
    pub recursive_by_default: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub handles: HandleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.listing.max_page_size == 0 || self.listing.max_page_size > SERVICE_MAX_PAGE_SIZE {
            return Err(ShareError::ConfigError(format!(
                "listing.max_page_size must be between 1 and {}",
                SERVICE_MAX_PAGE_SIZE
            )));
        }
        if let Some(default) = self.listing.default_page_size {
            if default == 0 || default > self.listing.max_page_size {
                return Err(ShareError::ConfigError(format!(
                    "listing.default_page_size {} must be between 1 and listing.max_page_size",
                    default
                )));
            }
        }
        Ok(())
    }
}
