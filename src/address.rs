//! Share addresses
//!
//! A [`ShareAddress`] names a resource inside a share as the share URI plus an
//! ordered list of path segments. Resolution never touches the network, and
//! parent/child relationships are computed from the segment list on demand.

use crate::error::{Result, ShareError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable hierarchical address of a directory or file within a share.
///
/// Zero segments denotes the share root. Segments are opaque: a name that
/// happens to look like an absolute URI is appended verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareAddress {
    share_uri: String,
    segments: Vec<String>,
}

impl ShareAddress {
    /// Address of the share root. Always succeeds.
    pub fn root(share_uri: impl Into<String>) -> Self {
        let share_uri = share_uri.into();
        let share_uri = share_uri.trim_end_matches('/').to_string();
        Self {
            share_uri,
            segments: Vec::new(),
        }
    }

    /// Append a single opaque segment.
    pub fn resolve(&self, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(ShareError::InvalidArgument(
                "path segment must not be empty".to_string(),
            ));
        }
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self {
            share_uri: self.share_uri.clone(),
            segments,
        })
    }

    /// Resolve a `/`-separated relative path one segment at a time.
    ///
    /// Leading and trailing separators are ignored; an empty interior segment
    /// (`a//b`) or an empty path is rejected.
    pub fn resolve_path(&self, path: &str) -> Result<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(ShareError::InvalidArgument(format!(
                "path '{}' contains no segments",
                path
            )));
        }
        trimmed
            .split('/')
            .try_fold(self.clone(), |address, segment| address.resolve(segment))
    }

    /// Address with the final segment removed, or `None` at the share root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self {
            share_uri: self.share_uri.clone(),
            segments,
        })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final segment; empty for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn share_uri(&self) -> &str {
        &self.share_uri
    }

    /// Share-relative path, `/`-joined, empty for the root.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    pub fn uri(&self) -> String {
        if self.segments.is_empty() {
            self.share_uri.clone()
        } else {
            format!("{}/{}", self.share_uri, self.path())
        }
    }

    /// True when `self` lies strictly beneath `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &ShareAddress) -> bool {
        self.share_uri == ancestor.share_uri
            && self.segments.len() > ancestor.segments.len()
            && self.segments.starts_with(&ancestor.segments)
    }
}

impl fmt::Display for ShareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}
