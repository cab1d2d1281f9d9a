//! Case-insensitive metadata map
//!
//! Keys compare and store case-insensitively; the most recently written
//! casing is kept for iteration but callers should not depend on it.

use crate::error::{Result, ShareError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    key: String,
    value: String,
}

/// User-defined name/value pairs attached to a directory or file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataMap {
    entries: BTreeMap<String, Entry>,
}

fn canonical(key: &str) -> String {
    key.to_lowercase()
}

/// Validate a single metadata pair.
pub fn validate_entry(key: &str, value: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(ShareError::InvalidArgument(
            "metadata key must not be empty".to_string(),
        ));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ShareError::InvalidArgument(format!(
            "metadata key '{}' contains whitespace or control characters",
            key
        )));
    }
    if value.is_empty() {
        return Err(ShareError::InvalidArgument(format!(
            "metadata value for key '{}' must not be empty",
            key
        )));
    }
    Ok(())
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a pair. Invalid pairs are rejected and the map is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_entry(key, value)?;
        self.insert_unchecked(key, value);
        Ok(())
    }

    /// Insert without validation; used when materializing service responses.
    pub(crate) fn insert_unchecked(&mut self, key: &str, value: &str) {
        self.entries.insert(
            canonical(key),
            Entry {
                key: key.to_string(),
                value: value.to_string(),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&canonical(key))
            .map(|entry| entry.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&canonical(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&canonical(key)).map(|entry| entry.value)
    }

    /// Number of distinct case-insensitive keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|entry| (entry.key.as_str(), entry.value.as_str()))
    }

    /// Re-check every pair before the map is transmitted.
    pub fn validate(&self) -> Result<()> {
        self.iter().try_for_each(|(key, value)| validate_entry(key, value))
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for MetadataMap {
    /// Builds a map without validation; call [`MetadataMap::validate`] before use.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MetadataMap::new();
        for (key, value) in iter {
            map.insert_unchecked(key.as_ref(), value.as_ref());
        }
        map
    }
}
