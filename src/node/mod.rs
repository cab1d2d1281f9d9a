//! Directory and file nodes
//!
//! Nodes are client-side handles onto a path in a share. Constructing one never
//! touches the service, so a node may describe a resource that does not exist
//! yet. Each node owns its own [`PropertySet`] and [`MetadataMap`]; two nodes for
//! the same path are independent instances with no shared staging state.

mod directory;
mod file;
mod item;
pub mod sources;

pub use directory::DirectoryNode;
pub use file::FileNode;
pub use item::ListItem;
pub use sources::{ChildListing, ClosedHandles, HandleClosing, HandleListing};

use crate::address::ShareAddress;
use crate::endpoint::{CloseHandlesPage, CreateRequest, HandleInfo, HandleTarget, ItemKind};
use crate::error::{ConflictKind, Result, ShareError};
use crate::metadata::MetadataMap;
use crate::properties::{PropertySet, PropertyValues};
use crate::segment::{ContinuationToken, Segment, TokenKind};
use crate::share::{MutatingOperation, Share, ShareContext, SnapshotGuard};
use std::sync::Arc;
use tracing::{debug, info};

/// Options for directory listings.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Only return children whose name starts with this prefix
    pub prefix: Option<String>,
    /// Maximum items per page; the service may return fewer
    pub page_size_hint: Option<u32>,
}

impl ListOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size_hint = Some(page_size);
        self
    }
}

/// Options for handle enumeration.
#[derive(Debug, Clone, Default)]
pub struct HandleOptions {
    /// Include handles opened on descendants; falls back to the client config
    pub recursive: Option<bool>,
    pub page_size_hint: Option<u32>,
}

impl HandleOptions {
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size_hint = Some(page_size);
        self
    }
}

/// State and lifecycle shared by both node kinds.
#[derive(Debug, Clone)]
pub(crate) struct NodeCore {
    share: Arc<ShareContext>,
    address: ShareAddress,
    kind: ItemKind,
    properties: PropertySet,
    metadata: MetadataMap,
}

impl NodeCore {
    pub(crate) fn new(share: Arc<ShareContext>, address: ShareAddress, kind: ItemKind) -> Self {
        Self::with_confirmed(share, address, kind, PropertyValues::new())
    }

    pub(crate) fn with_confirmed(
        share: Arc<ShareContext>,
        address: ShareAddress,
        kind: ItemKind,
        confirmed: PropertyValues,
    ) -> Self {
        Self {
            share,
            address,
            kind,
            properties: PropertySet::from_confirmed(confirmed),
            metadata: MetadataMap::new(),
        }
    }

    pub(crate) fn address(&self) -> &ShareAddress {
        &self.address
    }

    pub(crate) fn share_context(&self) -> &Arc<ShareContext> {
        &self.share
    }

    pub(crate) fn share(&self) -> Share {
        Share::from_context(Arc::clone(&self.share))
    }

    pub(crate) fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub(crate) fn properties_mut(&mut self) -> &mut PropertySet {
        &mut self.properties
    }

    pub(crate) fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut MetadataMap {
        &mut self.metadata
    }

    /// Same resource in the same share view.
    pub(crate) fn same_resource(&self, other: &NodeCore) -> bool {
        self.kind == other.kind && self.address == other.address && self.share == other.share
    }

    pub(crate) async fn create(&mut self, extra: PropertyValues) -> Result<()> {
        SnapshotGuard::check(&self.share, MutatingOperation::Create, &self.address)?;
        self.properties.validate_pending()?;
        self.metadata.validate()?;

        let mut properties = self.properties.pending_values().clone();
        for (tag, value) in extra.iter() {
            properties.insert(tag, value.clone());
        }
        let request = CreateRequest {
            kind: self.kind,
            properties,
            metadata: self.metadata.clone(),
        };
        let confirmed = self
            .share
            .endpoint()
            .create_resource(&self.address, request)
            .await?;
        self.properties.commit_from_server(confirmed);
        info!(uri = %self.address, kind = %self.kind, "Created resource");
        Ok(())
    }

    pub(crate) async fn create_if_not_exists(&mut self, extra: PropertyValues) -> Result<bool> {
        SnapshotGuard::check(&self.share, MutatingOperation::Create, &self.address)?;
        if self.address.is_root() {
            // The root exists whenever the share does; a missing share still surfaces NotFound.
            self.fetch_attributes().await?;
            return Ok(false);
        }
        match self.create(extra).await {
            Ok(()) => Ok(true),
            Err(ShareError::Conflict {
                kind: ConflictKind::AlreadyExists,
                ..
            }) => {
                debug!(uri = %self.address, "Resource already exists");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn delete(&self) -> Result<()> {
        SnapshotGuard::check(&self.share, MutatingOperation::Delete, &self.address)?;
        if self.address.is_root() {
            return Err(ShareError::InvalidOperation(
                "the share root directory cannot be deleted".to_string(),
            ));
        }
        self.share
            .endpoint()
            .delete_resource(&self.address, self.kind)
            .await?;
        info!(uri = %self.address, kind = %self.kind, "Deleted resource");
        Ok(())
    }

    pub(crate) async fn delete_if_exists(&self) -> Result<bool> {
        match self.delete().await {
            Ok(()) => Ok(true),
            Err(e) if e.is_absent_resource() => {
                debug!(uri = %self.address, "Nothing to delete");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn exists(&mut self) -> Result<bool> {
        match self.fetch_attributes().await {
            Ok(()) => Ok(true),
            Err(e) if e.is_absent_resource() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Replace confirmed properties and metadata wholesale; staged values are discarded.
    pub(crate) async fn fetch_attributes(&mut self) -> Result<()> {
        let fetched = self
            .share
            .endpoint()
            .fetch_resource(&self.address, self.kind, self.share.snapshot_time())
            .await?;
        self.properties.replace_from_server(fetched.properties);
        self.metadata = fetched.metadata;
        debug!(
            uri = %self.address,
            metadata = self.metadata.len(),
            "Fetched attributes"
        );
        Ok(())
    }

    /// Submit only the staged subset; the service keeps everything else as stored.
    pub(crate) async fn set_properties(&mut self) -> Result<()> {
        SnapshotGuard::check(&self.share, MutatingOperation::SetProperties, &self.address)?;
        self.properties.validate_pending()?;

        let update = self.properties.pending_values().clone();
        let staged = update.len();
        let confirmed = self
            .share
            .endpoint()
            .set_properties(&self.address, self.kind, update)
            .await?;
        self.properties.commit_from_server(confirmed);
        debug!(uri = %self.address, staged, "Set properties");
        Ok(())
    }

    /// Replace the server-side metadata with the local map.
    pub(crate) async fn set_metadata(&mut self) -> Result<()> {
        SnapshotGuard::check(&self.share, MutatingOperation::SetMetadata, &self.address)?;
        self.metadata.validate()?;
        self.share
            .endpoint()
            .set_metadata(&self.address, self.kind, &self.metadata)
            .await?;
        debug!(uri = %self.address, entries = self.metadata.len(), "Set metadata");
        Ok(())
    }

    fn recursive(&self, requested: Option<bool>) -> bool {
        requested.unwrap_or(self.share.config().handles.recursive_by_default)
    }

    pub(crate) fn handle_listing(&self, options: &HandleOptions) -> Result<(HandleListing, Option<u32>)> {
        let page_size = self
            .share
            .config()
            .listing
            .resolve_page_size(options.page_size_hint)?;
        let source = HandleListing::new(
            Arc::clone(&self.share),
            self.address.clone(),
            self.recursive(options.recursive),
        );
        Ok((source, page_size))
    }

    pub(crate) async fn list_handles_segmented(
        &self,
        token: Option<&ContinuationToken>,
        options: &HandleOptions,
    ) -> Result<Segment<HandleInfo>> {
        if let Some(token) = token {
            token.ensure_kind(TokenKind::Handles)?;
        }
        let page_size = self
            .share
            .config()
            .listing
            .resolve_page_size(options.page_size_hint)?;
        self.share
            .endpoint()
            .list_open_handles(
                &self.address,
                self.share.snapshot_time(),
                self.recursive(options.recursive),
                page_size,
                token,
            )
            .await
    }

    pub(crate) async fn close_handles_segmented(
        &self,
        target: HandleTarget,
        token: Option<&ContinuationToken>,
        recursive: Option<bool>,
    ) -> Result<CloseHandlesPage> {
        if let HandleTarget::Id(id) = &target {
            if id.is_empty() {
                return Err(ShareError::InvalidArgument(
                    "handle id must not be empty".to_string(),
                ));
            }
        }
        if let Some(token) = token {
            token.ensure_kind(TokenKind::CloseHandles)?;
        }
        let page = self
            .share
            .endpoint()
            .close_handles(
                &self.address,
                self.share.snapshot_time(),
                &target,
                self.recursive(recursive),
                token,
            )
            .await?;
        info!(
            uri = %self.address,
            handles = %target,
            closed = page.closed_count,
            "Closed handles"
        );
        Ok(page)
    }

    pub(crate) fn handle_closing(&self, target: HandleTarget, recursive: Option<bool>) -> HandleClosing {
        HandleClosing::new(
            Arc::clone(&self.share),
            self.address.clone(),
            target,
            self.recursive(recursive),
        )
    }
}
