//! Share context
//!
//! A [`Share`] is a cheap handle onto one share (or one snapshot of it). Nodes
//! obtained from it hold the same immutable context, which carries the share URI,
//! the snapshot timestamp if any, the service endpoint and the client config.

pub mod guard;

use crate::address::ShareAddress;
use crate::config::ClientConfig;
use crate::endpoint::{ItemKind, ServiceEndpoint};
use crate::error::{Result, ShareError};
use crate::node::{DirectoryNode, FileNode};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

pub use guard::{MutatingOperation, SnapshotGuard};

/// Immutable state shared by every node of one share view.
pub struct ShareContext {
    name: String,
    uri: String,
    snapshot: Option<DateTime<Utc>>,
    endpoint: Arc<dyn ServiceEndpoint>,
    config: Arc<ClientConfig>,
}

impl ShareContext {
    pub(crate) fn new(
        name: impl Into<String>,
        uri: String,
        snapshot: Option<DateTime<Utc>>,
        endpoint: Arc<dyn ServiceEndpoint>,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            name: name.into(),
            uri,
            snapshot,
            endpoint,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn snapshot_time(&self) -> Option<DateTime<Utc>> {
        self.snapshot
    }

    pub fn is_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub(crate) fn endpoint(&self) -> &dyn ServiceEndpoint {
        self.endpoint.as_ref()
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl fmt::Debug for ShareContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareContext")
            .field("name", &self.name)
            .field("uri", &self.uri)
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

impl PartialEq for ShareContext {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri && self.snapshot == other.snapshot
    }
}

impl Eq for ShareContext {}

/// Handle onto a share or one of its snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    context: Arc<ShareContext>,
}

impl Share {
    pub(crate) fn new(context: ShareContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    pub(crate) fn from_context(context: Arc<ShareContext>) -> Self {
        Self { context }
    }

    pub(crate) fn context(&self) -> &Arc<ShareContext> {
        &self.context
    }

    pub fn name(&self) -> &str {
        self.context.name()
    }

    pub fn uri(&self) -> &str {
        self.context.uri()
    }

    pub fn is_snapshot(&self) -> bool {
        self.context.is_snapshot()
    }

    pub fn snapshot_time(&self) -> Option<DateTime<Utc>> {
        self.context.snapshot_time()
    }

    /// Read-only view of this share as of `time`.
    pub fn snapshot(&self, time: DateTime<Utc>) -> Share {
        Share::new(ShareContext::new(
            self.context.name.clone(),
            self.context.uri.clone(),
            Some(time),
            Arc::clone(&self.context.endpoint),
            Arc::clone(&self.context.config),
        ))
    }

    /// The live share this view belongs to.
    pub fn base_share(&self) -> Share {
        if !self.is_snapshot() {
            return self.clone();
        }
        Share::new(ShareContext::new(
            self.context.name.clone(),
            self.context.uri.clone(),
            None,
            Arc::clone(&self.context.endpoint),
            Arc::clone(&self.context.config),
        ))
    }

    pub fn root_directory(&self) -> DirectoryNode {
        DirectoryNode::new(
            Arc::clone(&self.context),
            ShareAddress::root(self.context.uri()),
        )
    }

    /// Directory at a `/`-separated share-relative path. No round trip.
    pub fn directory(&self, path: &str) -> Result<DirectoryNode> {
        let address = ShareAddress::root(self.context.uri()).resolve_path(path)?;
        Ok(DirectoryNode::new(Arc::clone(&self.context), address))
    }

    /// File at a `/`-separated share-relative path. No round trip.
    pub fn file(&self, path: &str) -> Result<FileNode> {
        let address = ShareAddress::root(self.context.uri()).resolve_path(path)?;
        Ok(FileNode::new(Arc::clone(&self.context), address))
    }

    /// Whether the share (or snapshot) exists, probed through its root directory.
    pub async fn exists(&self) -> Result<bool> {
        let root = ShareAddress::root(self.context.uri());
        match self
            .context
            .endpoint()
            .fetch_resource(&root, ItemKind::Directory, self.snapshot_time())
            .await
        {
            Ok(_) => Ok(true),
            Err(ShareError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
