//! Error types
//!
//! Every failure surfaced by the crate is a [`ShareError`]. Locally detected
//! violations (bad path segments, invalid metadata, snapshot mutation) are raised
//! before any request reaches the service endpoint; service-reported failures are
//! passed through unchanged.

use std::fmt;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ShareError>;

/// Which part of the namespace was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    /// The addressed directory or file does not exist
    Resource,
    /// An ancestor directory of the addressed resource does not exist
    Parent,
    /// The share itself does not exist
    Share,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundKind::Resource => write!(f, "resource not found"),
            NotFoundKind::Parent => write!(f, "parent not found"),
            NotFoundKind::Share => write!(f, "share not found"),
        }
    }
}

/// Why the service refused an operation with a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    AlreadyExists,
    DirectoryNotEmpty,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::AlreadyExists => write!(f, "resource already exists"),
            ConflictKind::DirectoryNotEmpty => write!(f, "directory is not empty"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind}: {resource}")]
    NotFound { kind: NotFoundKind, resource: String },

    #[error("{kind}: {resource}")]
    Conflict { kind: ConflictKind, resource: String },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ShareError {
    pub fn not_found(kind: NotFoundKind, resource: impl Into<String>) -> Self {
        ShareError::NotFound {
            kind,
            resource: resource.into(),
        }
    }

    pub fn conflict(kind: ConflictKind, resource: impl Into<String>) -> Self {
        ShareError::Conflict {
            kind,
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ShareError::NotFound { .. })
    }

    /// True only for a missing ancestor, not for a missing target.
    pub fn is_parent_not_found(&self) -> bool {
        matches!(
            self,
            ShareError::NotFound {
                kind: NotFoundKind::Parent,
                ..
            }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ShareError::Conflict { .. })
    }

    /// Missing target or missing ancestor; a missing share is not "absent", it is an error.
    pub(crate) fn is_absent_resource(&self) -> bool {
        matches!(
            self,
            ShareError::NotFound {
                kind: NotFoundKind::Resource | NotFoundKind::Parent,
                ..
            }
        )
    }
}

impl From<config::ConfigError> for ShareError {
    fn from(err: config::ConfigError) -> Self {
        ShareError::ConfigError(err.to_string())
    }
}
