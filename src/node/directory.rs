use super::sources::{ChildListing, HandleClosing, HandleListing};
use super::{FileNode, HandleOptions, ListItem, ListOptions, NodeCore};
use crate::address::ShareAddress;
use crate::endpoint::{CloseHandlesPage, HandleInfo, HandleTarget, ItemKind};
use crate::error::Result;
use crate::metadata::MetadataMap;
use crate::properties::{PropertySet, PropertyValues};
use crate::segment::{ContinuationToken, Segment, SegmentSource, SegmentedEnumerator};
use crate::share::{Share, ShareContext};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A directory in a share, or the share root.
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    core: NodeCore,
}

impl DirectoryNode {
    pub(crate) fn new(share: Arc<ShareContext>, address: ShareAddress) -> Self {
        Self {
            core: NodeCore::new(share, address, ItemKind::Directory),
        }
    }

    pub(crate) fn with_properties(
        share: Arc<ShareContext>,
        address: ShareAddress,
        confirmed: PropertyValues,
    ) -> Self {
        Self {
            core: NodeCore::with_confirmed(share, address, ItemKind::Directory, confirmed),
        }
    }

    pub fn address(&self) -> &ShareAddress {
        self.core.address()
    }

    pub fn uri(&self) -> String {
        self.core.address().uri()
    }

    /// Last path segment; empty for the share root.
    pub fn name(&self) -> &str {
        self.core.address().name()
    }

    pub fn is_root(&self) -> bool {
        self.core.address().is_root()
    }

    pub fn share(&self) -> Share {
        self.core.share()
    }

    pub fn snapshot_time(&self) -> Option<DateTime<Utc>> {
        self.core.share_context().snapshot_time()
    }

    pub fn properties(&self) -> &PropertySet {
        self.core.properties()
    }

    pub fn properties_mut(&mut self) -> &mut PropertySet {
        self.core.properties_mut()
    }

    pub fn metadata(&self) -> &MetadataMap {
        self.core.metadata()
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataMap {
        self.core.metadata_mut()
    }

    /// Containing directory, derived from the path; `None` at the share root.
    pub fn parent(&self) -> Option<DirectoryNode> {
        self.core.address().parent().map(|address| {
            DirectoryNode::new(Arc::clone(self.core.share_context()), address)
        })
    }

    /// Child directory reference. No round trip.
    pub fn get_directory(&self, name: &str) -> Result<DirectoryNode> {
        let address = self.core.address().resolve(name)?;
        Ok(DirectoryNode::new(
            Arc::clone(self.core.share_context()),
            address,
        ))
    }

    /// Child file reference. No round trip.
    pub fn get_file(&self, name: &str) -> Result<FileNode> {
        let address = self.core.address().resolve(name)?;
        Ok(FileNode::new(Arc::clone(self.core.share_context()), address))
    }

    /// Create the directory with any staged properties and the local metadata.
    pub async fn create(&mut self) -> Result<()> {
        self.core.create(PropertyValues::new()).await
    }

    /// `Ok(false)` when something already exists at this path.
    pub async fn create_if_not_exists(&mut self) -> Result<bool> {
        self.core.create_if_not_exists(PropertyValues::new()).await
    }

    /// Delete an empty directory. The share root cannot be deleted.
    pub async fn delete(&self) -> Result<()> {
        self.core.delete().await
    }

    pub async fn delete_if_exists(&self) -> Result<bool> {
        self.core.delete_if_exists().await
    }

    /// Probe existence; on success the node's properties and metadata are refreshed.
    pub async fn exists(&mut self) -> Result<bool> {
        self.core.exists().await
    }

    pub async fn fetch_attributes(&mut self) -> Result<()> {
        self.core.fetch_attributes().await
    }

    pub async fn set_properties(&mut self) -> Result<()> {
        self.core.set_properties().await
    }

    pub async fn set_metadata(&mut self) -> Result<()> {
        self.core.set_metadata().await
    }

    /// Lazy enumeration of direct children in service order.
    pub fn list_items(&self, options: ListOptions) -> Result<SegmentedEnumerator<ChildListing>> {
        let (source, page_size) = self.child_listing(options)?;
        Ok(SegmentedEnumerator::new(source, page_size))
    }

    /// Continue a listing from a token returned by an earlier page.
    pub fn resume_list_items(
        &self,
        token: ContinuationToken,
        options: ListOptions,
    ) -> Result<SegmentedEnumerator<ChildListing>> {
        let (source, page_size) = self.child_listing(options)?;
        SegmentedEnumerator::resume_from(source, token, page_size)
    }

    /// One page of children.
    pub async fn list_items_segmented(
        &self,
        token: Option<&ContinuationToken>,
        options: ListOptions,
    ) -> Result<Segment<ListItem>> {
        let (source, page_size) = self.child_listing(options)?;
        source.fetch_segment(token, page_size).await
    }

    fn child_listing(&self, options: ListOptions) -> Result<(ChildListing, Option<u32>)> {
        let share = self.core.share_context();
        let page_size = share
            .config()
            .listing
            .resolve_page_size(options.page_size_hint)?;
        let source = ChildListing::new(
            Arc::clone(share),
            self.core.address().clone(),
            options.prefix,
        );
        Ok((source, page_size))
    }

    /// Lazy enumeration of open handles on this directory (and descendants when recursive).
    pub fn list_handles(&self, options: &HandleOptions) -> Result<SegmentedEnumerator<HandleListing>> {
        let (source, page_size) = self.core.handle_listing(options)?;
        Ok(SegmentedEnumerator::new(source, page_size))
    }

    pub async fn list_handles_segmented(
        &self,
        token: Option<&ContinuationToken>,
        options: &HandleOptions,
    ) -> Result<Segment<HandleInfo>> {
        self.core.list_handles_segmented(token, options).await
    }

    /// Every open handle, following tokens until the sequence ends.
    pub async fn all_handles(&self, options: &HandleOptions) -> Result<Vec<HandleInfo>> {
        self.list_handles(options)?.collect_all().await
    }

    /// Close one page worth of handles.
    pub async fn close_handles_segmented(
        &self,
        token: Option<&ContinuationToken>,
        recursive: Option<bool>,
    ) -> Result<CloseHandlesPage> {
        self.core
            .close_handles_segmented(HandleTarget::All, token, recursive)
            .await
    }

    /// Close a single handle by id.
    pub async fn close_handle_segmented(
        &self,
        handle_id: &str,
        token: Option<&ContinuationToken>,
    ) -> Result<CloseHandlesPage> {
        self.core
            .close_handles_segmented(HandleTarget::Id(handle_id.to_string()), token, Some(false))
            .await
    }

    /// Page-by-page driver for closing every handle.
    pub fn close_handles(&self, recursive: Option<bool>) -> SegmentedEnumerator<HandleClosing> {
        SegmentedEnumerator::new(self.core.handle_closing(HandleTarget::All, recursive), None)
    }

    /// Close every handle and return the total number closed.
    pub async fn close_all_handles(&self, recursive: Option<bool>) -> Result<u32> {
        let reports = self.close_handles(recursive).collect_all().await?;
        Ok(reports.iter().map(|report| report.closed).sum())
    }
}

impl PartialEq for DirectoryNode {
    fn eq(&self, other: &Self) -> bool {
        self.core.same_resource(&other.core)
    }
}
