//! Service endpoint contract
//!
//! The namespace engine never talks to the network itself. Everything that needs a
//! round trip goes through a [`ServiceEndpoint`], which is responsible for transport,
//! authentication, wire encoding, and mapping service status codes onto
//! [`ShareError`](crate::error::ShareError) kinds.

pub mod memory;

use crate::address::ShareAddress;
use crate::error::Result;
use crate::metadata::MetadataMap;
use crate::properties::PropertyValues;
use crate::segment::{ContinuationToken, Segment};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use memory::InMemoryShareService;

/// Namespace entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Directory,
    File,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Directory => write!(f, "directory"),
            ItemKind::File => write!(f, "file"),
        }
    }
}

/// Point-in-time share view a read is served from; `None` reads live state.
pub type SnapshotTime = Option<DateTime<Utc>>;

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub kind: ItemKind,
    pub properties: PropertyValues,
    pub metadata: MetadataMap,
}

/// Full state of a resource as returned by a fetch.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub kind: ItemKind,
    pub properties: PropertyValues,
    pub metadata: MetadataMap,
}

/// One child returned by a directory listing.
#[derive(Debug, Clone)]
pub struct ListEntry {
    pub name: String,
    pub kind: ItemKind,
    pub properties: PropertyValues,
}

/// An open SMB handle reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleInfo {
    pub handle_id: String,
    /// Share-relative path of the resource the handle is open on
    pub path: String,
    pub file_id: String,
    pub parent_id: String,
    pub session_id: String,
    pub client_ip: String,
    pub opened_at: DateTime<Utc>,
    pub last_reconnected_at: Option<DateTime<Utc>>,
}

/// Which handles a close request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleTarget {
    All,
    Id(String),
}

impl fmt::Display for HandleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleTarget::All => write!(f, "*"),
            HandleTarget::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Result of one handle-close round trip.
#[derive(Debug, Clone)]
pub struct CloseHandlesPage {
    pub closed_count: u32,
    pub failed_count: u32,
    pub continuation: Option<ContinuationToken>,
}

/// Remote operations consumed by directory and file nodes.
#[async_trait]
pub trait ServiceEndpoint: Send + Sync {
    /// Create a directory or file. Fails with `NotFound(Parent)` when an ancestor is
    /// missing and `Conflict(AlreadyExists)` when something already lives at the address.
    async fn create_resource(
        &self,
        address: &ShareAddress,
        request: CreateRequest,
    ) -> Result<PropertyValues>;

    /// Delete a directory or file. Non-empty directories fail with `Conflict(DirectoryNotEmpty)`.
    async fn delete_resource(&self, address: &ShareAddress, kind: ItemKind) -> Result<()>;

    async fn fetch_resource(
        &self,
        address: &ShareAddress,
        kind: ItemKind,
        snapshot: SnapshotTime,
    ) -> Result<FetchedResource>;

    /// Apply `properties` only; attributes absent from the request keep their stored values.
    async fn set_properties(
        &self,
        address: &ShareAddress,
        kind: ItemKind,
        properties: PropertyValues,
    ) -> Result<PropertyValues>;

    /// Replace the stored metadata with `metadata`.
    async fn set_metadata(
        &self,
        address: &ShareAddress,
        kind: ItemKind,
        metadata: &MetadataMap,
    ) -> Result<()>;

    async fn list_children(
        &self,
        address: &ShareAddress,
        snapshot: SnapshotTime,
        prefix: Option<&str>,
        page_size_hint: Option<u32>,
        token: Option<&ContinuationToken>,
    ) -> Result<Segment<ListEntry>>;

    async fn list_open_handles(
        &self,
        address: &ShareAddress,
        snapshot: SnapshotTime,
        recursive: bool,
        page_size_hint: Option<u32>,
        token: Option<&ContinuationToken>,
    ) -> Result<Segment<HandleInfo>>;

    async fn close_handles(
        &self,
        address: &ShareAddress,
        snapshot: SnapshotTime,
        target: &HandleTarget,
        recursive: bool,
        token: Option<&ContinuationToken>,
    ) -> Result<CloseHandlesPage>;
}
