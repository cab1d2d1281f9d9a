use super::sources::{HandleClosing, HandleListing};
use super::{DirectoryNode, HandleOptions, NodeCore};
use crate::address::ShareAddress;
use crate::endpoint::{CloseHandlesPage, HandleInfo, HandleTarget, ItemKind};
use crate::error::Result;
use crate::metadata::MetadataMap;
use crate::properties::{PropertySet, PropertyTag, PropertyValue, PropertyValues};
use crate::segment::{ContinuationToken, Segment, SegmentedEnumerator};
use crate::share::{Share, ShareContext};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A file in a share. Content transfer is out of scope; only the namespace
/// entry, its properties and its handles are managed here.
#[derive(Debug, Clone)]
pub struct FileNode {
    core: NodeCore,
}

impl FileNode {
    pub(crate) fn new(share: Arc<ShareContext>, address: ShareAddress) -> Self {
        Self {
            core: NodeCore::new(share, address, ItemKind::File),
        }
    }

    pub(crate) fn with_properties(
        share: Arc<ShareContext>,
        address: ShareAddress,
        confirmed: PropertyValues,
    ) -> Self {
        Self {
            core: NodeCore::with_confirmed(share, address, ItemKind::File, confirmed),
        }
    }

    pub fn address(&self) -> &ShareAddress {
        self.core.address()
    }

    pub fn uri(&self) -> String {
        self.core.address().uri()
    }

    pub fn name(&self) -> &str {
        self.core.address().name()
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

    /// Confirmed content length, if known.
    pub fn length(&self) -> Option<u64> {
        self.core.properties().content_length()
    }

    /// The directory containing this file.
    pub fn parent(&self) -> DirectoryNode {
        let address = self
            .core
            .address()
            .parent()
            .unwrap_or_else(|| ShareAddress::root(self.core.address().share_uri()));
        DirectoryNode::new(Arc::clone(self.core.share_context()), address)
    }

    /// Create the file with the given length; staged properties and local metadata go along.
    pub async fn create(&mut self, length: u64) -> Result<()> {
        self.core.create(Self::length_value(length)).await
    }

    pub async fn create_if_not_exists(&mut self, length: u64) -> Result<bool> {
        self.core
            .create_if_not_exists(Self::length_value(length))
            .await
    }

    fn length_value(length: u64) -> PropertyValues {
        PropertyValues::new().with(PropertyTag::ContentLength, PropertyValue::Length(length))
    }

    pub async fn delete(&self) -> Result<()> {
        self.core.delete().await
    }

    pub async fn delete_if_exists(&self) -> Result<bool> {
        self.core.delete_if_exists().await
    }

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

    /// Set the file length. Any other staged properties are submitted with it.
    pub async fn resize(&mut self, length: u64) -> Result<()> {
        self.core.properties_mut().set_content_length(length);
        self.core.set_properties().await
    }

    pub fn list_handles(&self, options: &HandleOptions) -> Result<SegmentedEnumerator<HandleListing>> {
        let (source, page_size) = self.core.handle_listing(&Self::flat(options))?;
        Ok(SegmentedEnumerator::new(source, page_size))
    }

    pub async fn list_handles_segmented(
        &self,
        token: Option<&ContinuationToken>,
        options: &HandleOptions,
    ) -> Result<Segment<HandleInfo>> {
        self.core
            .list_handles_segmented(token, &Self::flat(options))
            .await
    }

    pub async fn all_handles(&self, options: &HandleOptions) -> Result<Vec<HandleInfo>> {
        self.list_handles(options)?.collect_all().await
    }

    pub async fn close_handles_segmented(
        &self,
        token: Option<&ContinuationToken>,
    ) -> Result<CloseHandlesPage> {
        self.core
            .close_handles_segmented(HandleTarget::All, token, Some(false))
            .await
    }

    pub async fn close_handle_segmented(
        &self,
        handle_id: &str,
        token: Option<&ContinuationToken>,
    ) -> Result<CloseHandlesPage> {
        self.core
            .close_handles_segmented(HandleTarget::Id(handle_id.to_string()), token, Some(false))
            .await
    }

    pub fn close_handles(&self) -> SegmentedEnumerator<HandleClosing> {
        SegmentedEnumerator::new(
            self.core.handle_closing(HandleTarget::All, Some(false)),
            None,
        )
    }

    pub async fn close_all_handles(&self) -> Result<u32> {
        let reports = self.close_handles().collect_all().await?;
        Ok(reports.iter().map(|report| report.closed).sum())
    }

    // Recursion has no meaning below a file.
    fn flat(options: &HandleOptions) -> HandleOptions {
        HandleOptions {
            recursive: Some(false),
            page_size_hint: options.page_size_hint,
        }
    }
}

impl PartialEq for FileNode {
    fn eq(&self, other: &Self) -> bool {
        self.core.same_resource(&other.core)
    }
}
