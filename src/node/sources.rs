//! Segment sources backing directory listings and handle operations.

use super::item::ListItem;
use crate::address::ShareAddress;
use crate::endpoint::{HandleInfo, HandleTarget};
use crate::error::Result;
use crate::segment::{ContinuationToken, Segment, SegmentSource, TokenKind};
use crate::share::ShareContext;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Children of one directory, optionally filtered by name prefix.
pub struct ChildListing {
    share: Arc<ShareContext>,
    directory: ShareAddress,
    prefix: Option<String>,
}

impl ChildListing {
    pub(crate) fn new(
        share: Arc<ShareContext>,
        directory: ShareAddress,
        prefix: Option<String>,
    ) -> Self {
        Self {
            share,
            directory,
            prefix,
        }
    }
}

#[async_trait]
impl SegmentSource for ChildListing {
    type Item = ListItem;

    fn kind(&self) -> TokenKind {
        TokenKind::Listing
    }

    async fn fetch_segment(
        &self,
        token: Option<&ContinuationToken>,
        page_size_hint: Option<u32>,
    ) -> Result<Segment<ListItem>> {
        if let Some(token) = token {
            token.ensure_kind(TokenKind::Listing)?;
        }
        let segment = self
            .share
            .endpoint()
            .list_children(
                &self.directory,
                self.share.snapshot_time(),
                self.prefix.as_deref(),
                page_size_hint,
                token,
            )
            .await?;

        let mut items = Vec::with_capacity(segment.items.len());
        for entry in segment.items {
            items.push(ListItem::from_entry(&self.share, &self.directory, entry)?);
        }
        debug!(uri = %self.directory, items = items.len(), "Listed children");
        Ok(Segment::new(items, segment.continuation))
    }
}

/// Open handles on a directory or file.
pub struct HandleListing {
    share: Arc<ShareContext>,
    address: ShareAddress,
    recursive: bool,
}

impl HandleListing {
    pub(crate) fn new(share: Arc<ShareContext>, address: ShareAddress, recursive: bool) -> Self {
        Self {
            share,
            address,
            recursive,
        }
    }
}

#[async_trait]
impl SegmentSource for HandleListing {
    type Item = HandleInfo;

    fn kind(&self) -> TokenKind {
        TokenKind::Handles
    }

    async fn fetch_segment(
        &self,
        token: Option<&ContinuationToken>,
        page_size_hint: Option<u32>,
    ) -> Result<Segment<HandleInfo>> {
        if let Some(token) = token {
            token.ensure_kind(TokenKind::Handles)?;
        }
        self.share
            .endpoint()
            .list_open_handles(
                &self.address,
                self.share.snapshot_time(),
                self.recursive,
                page_size_hint,
                token,
            )
            .await
    }
}

/// Counts reported by one close round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClosedHandles {
    pub closed: u32,
    pub failed: u32,
}

/// Closes handles page by page; each page yields a single [`ClosedHandles`] report.
pub struct HandleClosing {
    share: Arc<ShareContext>,
    address: ShareAddress,
    target: HandleTarget,
    recursive: bool,
}

impl HandleClosing {
    pub(crate) fn new(
        share: Arc<ShareContext>,
        address: ShareAddress,
        target: HandleTarget,
        recursive: bool,
    ) -> Self {
        Self {
            share,
            address,
            target,
            recursive,
        }
    }
}

#[async_trait]
impl SegmentSource for HandleClosing {
    type Item = ClosedHandles;

    fn kind(&self) -> TokenKind {
        TokenKind::CloseHandles
    }

    async fn fetch_segment(
        &self,
        token: Option<&ContinuationToken>,
        _page_size_hint: Option<u32>,
    ) -> Result<Segment<ClosedHandles>> {
        if let Some(token) = token {
            token.ensure_kind(TokenKind::CloseHandles)?;
        }
        let page = self
            .share
            .endpoint()
            .close_handles(
                &self.address,
                self.share.snapshot_time(),
                &self.target,
                self.recursive,
                token,
            )
            .await?;
        let report = ClosedHandles {
            closed: page.closed_count,
            failed: page.failed_count,
        };
        Ok(Segment::new(vec![report], page.continuation))
    }
}
