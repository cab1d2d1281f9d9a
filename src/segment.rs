//! Continuation-token pagination
//!
//! Listing, handle enumeration and handle closing are all served one page per
//! request. A [`SegmentedEnumerator`] drives any [`SegmentSource`] page by page,
//! holding only the current page and the last token it was handed.

use crate::error::{Result, ShareError};
use async_trait::async_trait;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

/// Which segmented operation issued a token. Tokens never cross operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Listing,
    Handles,
    CloseHandles,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Listing => write!(f, "listing"),
            TokenKind::Handles => write!(f, "handle listing"),
            TokenKind::CloseHandles => write!(f, "handle close"),
        }
    }
}

/// Opaque resumption cursor for a segmented operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContinuationToken {
    kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marker: Option<String>,
    next_marker: String,
}

impl ContinuationToken {
    pub fn new(kind: TokenKind, next_marker: impl Into<String>) -> Self {
        Self {
            kind,
            marker: None,
            next_marker: next_marker.into(),
        }
    }

    /// Attach the marker the page was requested with.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    pub fn next_marker(&self) -> &str {
        &self.next_marker
    }

    /// An empty next-marker means the sequence is complete.
    pub fn has_more(&self) -> bool {
        !self.next_marker.is_empty()
    }

    pub fn ensure_kind(&self, expected: TokenKind) -> Result<()> {
        if self.kind != expected {
            return Err(ShareError::InvalidArgument(format!(
                "continuation token from a {} operation cannot resume a {} operation",
                self.kind, expected
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ShareError::InvalidArgument(format!("Failed to encode token: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ShareError::InvalidArgument(format!("Malformed continuation token: {}", e)))
    }
}

/// True when no further page exists: the token is absent or its next-marker is empty.
pub fn is_terminal(token: Option<&ContinuationToken>) -> bool {
    token.map_or(true, |t| !t.has_more())
}

/// One page of a segmented operation.
#[derive(Debug, Clone)]
pub struct Segment<T> {
    pub items: Vec<T>,
    pub continuation: Option<ContinuationToken>,
}

impl<T> Segment<T> {
    pub fn new(items: Vec<T>, continuation: Option<ContinuationToken>) -> Self {
        Self {
            items,
            continuation,
        }
    }

    pub fn is_last(&self) -> bool {
        is_terminal(self.continuation.as_ref())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Segment<U> {
        Segment {
            items: self.items.into_iter().map(f).collect(),
            continuation: self.continuation,
        }
    }
}

/// A page-at-a-time producer; each call is one round trip to the service.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    type Item: Send;

    fn kind(&self) -> TokenKind;

    async fn fetch_segment(
        &self,
        token: Option<&ContinuationToken>,
        page_size_hint: Option<u32>,
    ) -> Result<Segment<Self::Item>>;
}

/// Sequential driver over a [`SegmentSource`].
///
/// The stored token only advances after a page arrives, so dropping an
/// in-flight fetch leaves the enumerator where it was and the fetch can be retried.
pub struct SegmentedEnumerator<S: SegmentSource> {
    source: S,
    token: Option<ContinuationToken>,
    page_size_hint: Option<u32>,
    finished: bool,
    pages_fetched: usize,
}

impl<S: SegmentSource> SegmentedEnumerator<S> {
    pub fn new(source: S, page_size_hint: Option<u32>) -> Self {
        Self {
            source,
            token: None,
            page_size_hint,
            finished: false,
            pages_fetched: 0,
        }
    }

    /// Continue a sequence from a previously returned token.
    pub fn resume_from(
        source: S,
        token: ContinuationToken,
        page_size_hint: Option<u32>,
    ) -> Result<Self> {
        token.ensure_kind(source.kind())?;
        let finished = !token.has_more();
        Ok(Self {
            source,
            token: Some(token),
            page_size_hint,
            finished,
            pages_fetched: 0,
        })
    }

    /// Fetch the next page, or `None` once the sequence has ended.
    pub async fn next_segment(&mut self) -> Result<Option<Vec<S::Item>>> {
        if self.finished {
            return Ok(None);
        }
        let segment = self
            .source
            .fetch_segment(self.token.as_ref(), self.page_size_hint)
            .await?;
        if let Some(token) = &segment.continuation {
            token.ensure_kind(self.source.kind())?;
        }

        self.pages_fetched += 1;
        self.finished = segment.is_last();
        self.token = if self.finished {
            None
        } else {
            segment.continuation
        };
        debug!(
            kind = %self.source.kind(),
            page = self.pages_fetched,
            items = segment.items.len(),
            finished = self.finished,
            "Fetched segment"
        );
        Ok(Some(segment.items))
    }

    /// Token that the next fetch will send; `None` before the first page and after the last.
    pub fn continuation(&self) -> Option<&ContinuationToken> {
        self.token.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Drain the remaining pages in order.
    pub async fn collect_all(mut self) -> Result<Vec<S::Item>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_segment().await? {
            items.extend(page);
        }
        Ok(items)
    }

    /// Lazy item stream; pages are requested only as items are consumed.
    pub fn into_stream(self) -> impl Stream<Item = Result<S::Item>> {
        stream::try_unfold((self, VecDeque::new()), Self::advance)
    }

    async fn advance(
        (mut enumerator, mut buffered): (Self, VecDeque<S::Item>),
    ) -> Result<Option<(S::Item, (Self, VecDeque<S::Item>))>> {
        loop {
            if let Some(item) = buffered.pop_front() {
                return Ok(Some((item, (enumerator, buffered))));
            }
            match enumerator.next_segment().await? {
                Some(page) => buffered.extend(page),
                None => return Ok(None),
            }
        }
    }
}
