//! Snapshot write guard
//!
//! A share snapshot is a read-only, point-in-time view. Every mutating node
//! operation passes through [`SnapshotGuard::check`] before building a request,
//! so a rejected call never reaches the service endpoint.

use super::ShareContext;
use crate::address::ShareAddress;
use crate::error::{Result, ShareError};
use std::fmt;
use tracing::warn;

/// Operations that change server-side state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutatingOperation {
    Create,
    Delete,
    SetProperties,
    SetMetadata,
}

impl fmt::Display for MutatingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutatingOperation::Create => write!(f, "Create"),
            MutatingOperation::Delete => write!(f, "Delete"),
            MutatingOperation::SetProperties => write!(f, "SetProperties"),
            MutatingOperation::SetMetadata => write!(f, "SetMetadata"),
        }
    }
}

pub struct SnapshotGuard;

impl SnapshotGuard {
    /// Fail with `InvalidOperation` when `share` is a snapshot view.
    pub fn check(
        share: &ShareContext,
        operation: MutatingOperation,
        address: &ShareAddress,
    ) -> Result<()> {
        if let Some(snapshot) = share.snapshot_time() {
            warn!(
                operation = %operation,
                uri = %address,
                snapshot = %snapshot.to_rfc3339(),
                "Rejected mutation against share snapshot"
            );
            return Err(ShareError::InvalidOperation(format!(
                "{} is not supported against a share snapshot ({})",
                operation,
                snapshot.to_rfc3339()
            )));
        }
        Ok(())
    }
}
