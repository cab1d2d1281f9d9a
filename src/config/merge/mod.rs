//! Merge policy: defaults first, every later source overrides earlier ones.

pub mod service;

use super::SERVICE_MAX_PAGE_SIZE;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the built-in defaults.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("listing.max_page_size", i64::from(SERVICE_MAX_PAGE_SIZE))?
        .set_default("handles.recursive_by_default", false)
}
