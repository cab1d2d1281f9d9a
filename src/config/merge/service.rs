//! MergeService: orchestrates sources, applies merge policy, deserializes to ClientConfig.

use crate::config::sources::{environment, file};
use crate::config::ClientConfig;
use config::ConfigError;
use std::path::Path;

use super::builder_with_defaults;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> file -> environment (highest).
    pub fn load(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = match path {
            Some(path) => file::add_to_builder(builder, path)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Inline TOML with environment overlay.
    pub fn load_from_str(toml: &str) -> Result<ClientConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = file::add_str_to_builder(builder, toml)?;
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        config.try_deserialize()
    }
}
