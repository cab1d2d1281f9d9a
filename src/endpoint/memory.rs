//! In-memory service endpoint
//!
//! A self-contained emulation of a file-share service: shares, point-in-time
//! snapshots, directories, files, metadata and open handles all live behind a
//! single `RwLock`. Used by the test suites and for offline experimentation.

use super::{
    CloseHandlesPage, CreateRequest, FetchedResource, HandleInfo, HandleTarget, ItemKind,
    ListEntry, ServiceEndpoint, SnapshotTime,
};
use crate::address::ShareAddress;
use crate::attributes::NtfsAttributes;
use crate::error::{ConflictKind, NotFoundKind, Result, ShareError};
use crate::metadata::MetadataMap;
use crate::properties::{PropertyTag, PropertyValue, PropertyValues};
use crate::segment::{ContinuationToken, Segment, TokenKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Largest page the emulated service will return for a listing.
pub const MAX_LIST_PAGE_SIZE: u32 = 5000;

/// Default page size for handle enumeration and handle closing.
pub const DEFAULT_HANDLE_PAGE_SIZE: u32 = 100;

const DEFAULT_PERMISSION: &str = "O:SYG:SYD:(A;OICI;FA;;;WD)";

const CONTENT_HEADERS: [PropertyTag; 6] = [
    PropertyTag::ContentType,
    PropertyTag::ContentEncoding,
    PropertyTag::ContentLanguage,
    PropertyTag::CacheControl,
    PropertyTag::ContentDisposition,
    PropertyTag::ContentMd5,
];

type Tree = BTreeMap<Vec<String>, StoredResource>;

#[derive(Debug, Clone)]
struct StoredResource {
    kind: ItemKind,
    properties: PropertyValues,
    metadata: MetadataMap,
}

impl StoredResource {
    fn file_id(&self) -> String {
        self.properties
            .get(PropertyTag::FileId)
            .and_then(PropertyValue::as_text)
            .unwrap_or("0")
            .to_string()
    }
}

#[derive(Debug, Clone)]
struct OpenHandle {
    id: String,
    path: Vec<String>,
    session_id: String,
    client_ip: String,
    opened_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ShareState {
    tree: Tree,
    handles: BTreeMap<String, OpenHandle>,
    snapshots: BTreeMap<DateTime<Utc>, Tree>,
}

#[derive(Debug, Default)]
struct State {
    shares: HashMap<String, ShareState>,
    next_id: u64,
    version: u64,
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn next_etag(&mut self) -> String {
        self.version += 1;
        let digest = blake3::hash(&self.version.to_le_bytes());
        format!("\"0x{}\"", hex::encode(&digest.as_bytes()[..8]).to_uppercase())
    }

    fn share(&self, address: &ShareAddress) -> Result<&ShareState> {
        self.shares
            .get(address.share_uri())
            .ok_or_else(|| ShareError::not_found(NotFoundKind::Share, address.share_uri()))
    }

    fn share_mut(&mut self, address: &ShareAddress) -> Result<&mut ShareState> {
        self.shares
            .get_mut(address.share_uri())
            .ok_or_else(|| ShareError::not_found(NotFoundKind::Share, address.share_uri()))
    }

    fn tree(&self, address: &ShareAddress, snapshot: SnapshotTime) -> Result<&Tree> {
        let share = self.share(address)?;
        match snapshot {
            None => Ok(&share.tree),
            Some(time) => share.snapshots.get(&time).ok_or_else(|| {
                ShareError::not_found(
                    NotFoundKind::Share,
                    format!("{}?sharesnapshot={}", address.share_uri(), time.to_rfc3339()),
                )
            }),
        }
    }
}

/// Classify a missing key: absent target under an existing directory, or absent ancestor.
fn missing(tree: &Tree, address: &ShareAddress) -> ShareError {
    let segments = address.segments();
    let parent = &segments[..segments.len().saturating_sub(1)];
    let kind = match tree.get(parent) {
        Some(resource) if resource.kind == ItemKind::Directory => NotFoundKind::Resource,
        _ => NotFoundKind::Parent,
    };
    ShareError::not_found(kind, address.uri())
}

fn lookup<'a>(tree: &'a Tree, address: &ShareAddress, kind: ItemKind) -> Result<&'a StoredResource> {
    match tree.get(address.segments()) {
        Some(resource) if resource.kind == kind => Ok(resource),
        Some(_) => Err(ShareError::not_found(NotFoundKind::Resource, address.uri())),
        None => Err(missing(tree, address)),
    }
}

fn lookup_any<'a>(tree: &'a Tree, address: &ShareAddress) -> Result<&'a StoredResource> {
    tree.get(address.segments())
        .ok_or_else(|| missing(tree, address))
}

fn permission_key_for(sddl: &str) -> String {
    let digest = blake3::hash(sddl.as_bytes());
    let bytes = digest.as_bytes();
    let mut high = [0u8; 8];
    let mut low = [0u8; 8];
    high.copy_from_slice(&bytes[..8]);
    low.copy_from_slice(&bytes[8..16]);
    format!("{}*{}", u64::from_le_bytes(high), u64::from_le_bytes(low))
}

fn touch(properties: &mut PropertyValues, etag: String, now: DateTime<Utc>) {
    properties.insert(PropertyTag::ETag, PropertyValue::Text(etag));
    properties.insert(PropertyTag::LastModified, PropertyValue::Time(now));
    properties.insert(PropertyTag::ChangeTime, PropertyValue::Time(now));
}

fn with_directory_flag(kind: ItemKind, value: PropertyValue) -> PropertyValue {
    match (kind, value) {
        (ItemKind::Directory, PropertyValue::Attributes(attrs)) => {
            PropertyValue::Attributes(attrs | NtfsAttributes::DIRECTORY)
        }
        (_, value) => value,
    }
}

fn handle_in_scope(handle: &OpenHandle, scope: &[String], recursive: bool) -> bool {
    handle.path == scope
        || (recursive && handle.path.len() > scope.len() && handle.path.starts_with(scope))
}

fn check_token(token: Option<&ContinuationToken>, kind: TokenKind) -> Result<Option<&str>> {
    match token {
        Some(token) => {
            token.ensure_kind(kind)?;
            Ok(Some(token.next_marker()).filter(|m| !m.is_empty()))
        }
        None => Ok(None),
    }
}

/// In-process emulation of the file-share service.
pub struct InMemoryShareService {
    base_uri: String,
    state: RwLock<State>,
    requests: AtomicU64,
    latency: Option<Duration>,
    handle_page_size: u32,
}

impl InMemoryShareService {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into().trim_end_matches('/').to_string(),
            state: RwLock::new(State::default()),
            requests: AtomicU64::new(0),
            latency: None,
            handle_page_size: DEFAULT_HANDLE_PAGE_SIZE,
        }
    }

    /// Delay every request by `latency` before it is served.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_handle_page_size(mut self, page_size: u32) -> Self {
        self.handle_page_size = page_size.max(1);
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn share_uri(&self, share_name: &str) -> String {
        format!("{}/{}", self.base_uri, share_name)
    }

    /// Number of requests received through the [`ServiceEndpoint`] interface.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn create_share(&self, share_name: &str) -> Result<()> {
        let share_uri = self.share_uri(share_name);
        let mut state = self.state.write();
        if state.shares.contains_key(&share_uri) {
            return Err(ShareError::conflict(ConflictKind::AlreadyExists, share_uri));
        }
        let now = Utc::now();
        let etag = state.next_etag();
        let mut properties = PropertyValues::new()
            .with(PropertyTag::FileId, PropertyValue::Text("0".to_string()))
            .with(PropertyTag::CreationTime, PropertyValue::Time(now))
            .with(PropertyTag::LastWriteTime, PropertyValue::Time(now))
            .with(
                PropertyTag::NtfsAttributes,
                PropertyValue::Attributes(NtfsAttributes::DIRECTORY),
            )
            .with(
                PropertyTag::PermissionKey,
                PropertyValue::Text(permission_key_for(DEFAULT_PERMISSION)),
            );
        touch(&mut properties, etag, now);

        let mut share = ShareState::default();
        share.tree.insert(
            Vec::new(),
            StoredResource {
                kind: ItemKind::Directory,
                properties,
                metadata: MetadataMap::new(),
            },
        );
        state.shares.insert(share_uri.clone(), share);
        debug!(share = %share_uri, "Created share");
        Ok(())
    }

    pub fn delete_share(&self, share_name: &str) -> Result<()> {
        let share_uri = self.share_uri(share_name);
        self.state
            .write()
            .shares
            .remove(&share_uri)
            .map(|_| ())
            .ok_or_else(|| ShareError::not_found(NotFoundKind::Share, share_uri))
    }

    /// Freeze the current namespace of a share; returns the snapshot timestamp.
    pub fn create_snapshot(&self, share_name: &str) -> Result<DateTime<Utc>> {
        let share_uri = self.share_uri(share_name);
        let mut state = self.state.write();
        let share = state
            .shares
            .get_mut(&share_uri)
            .ok_or_else(|| ShareError::not_found(NotFoundKind::Share, share_uri.clone()))?;
        let mut time = Utc::now();
        while share.snapshots.contains_key(&time) {
            time += chrono::Duration::microseconds(1);
        }
        share.snapshots.insert(time, share.tree.clone());
        debug!(share = %share_uri, snapshot = %time.to_rfc3339(), "Created share snapshot");
        Ok(time)
    }

    /// Simulate an SMB client opening the resource at `address`; returns the handle id.
    pub fn open_handle(&self, address: &ShareAddress) -> Result<String> {
        let mut state = self.state.write();
        let n = state.allocate_id();
        let share = state.share_mut(address)?;
        lookup_any(&share.tree, address)?;
        let id = format!("{:020}", n);
        share.handles.insert(
            id.clone(),
            OpenHandle {
                id: id.clone(),
                path: address.segments().to_vec(),
                session_id: format!("{:016x}", n.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
                client_ip: "127.0.0.1".to_string(),
                opened_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// Open handles across the whole share.
    pub fn open_handle_count(&self, share_name: &str) -> usize {
        self.state
            .read()
            .shares
            .get(&self.share_uri(share_name))
            .map(|share| share.handles.len())
            .unwrap_or(0)
    }

    async fn round_trip(&self, operation: &'static str, address: &ShareAddress) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        trace!(operation, uri = %address, "Request received");
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn handle_info(tree: &Tree, handle: &OpenHandle) -> HandleInfo {
        let file_id = tree
            .get(&handle.path)
            .map(StoredResource::file_id)
            .unwrap_or_else(|| "0".to_string());
        let parent_id = tree
            .get(&handle.path[..handle.path.len().saturating_sub(1)])
            .map(StoredResource::file_id)
            .unwrap_or_else(|| "0".to_string());
        HandleInfo {
            handle_id: handle.id.clone(),
            path: handle.path.join("/"),
            file_id,
            parent_id,
            session_id: handle.session_id.clone(),
            client_ip: handle.client_ip.clone(),
            opened_at: handle.opened_at,
            last_reconnected_at: None,
        }
    }
}

#[async_trait]
impl ServiceEndpoint for InMemoryShareService {
    async fn create_resource(
        &self,
        address: &ShareAddress,
        request: CreateRequest,
    ) -> Result<PropertyValues> {
        self.round_trip("create", address).await;
        let mut state = self.state.write();
        let file_id = state.allocate_id();
        let etag = state.next_etag();
        let share = state.share_mut(address)?;

        if address.is_root() || share.tree.contains_key(address.segments()) {
            return Err(ShareError::conflict(ConflictKind::AlreadyExists, address.uri()));
        }
        let parent_key = &address.segments()[..address.depth() - 1];
        let parent_id = match share.tree.get(parent_key) {
            Some(parent) if parent.kind == ItemKind::Directory => parent.file_id(),
            _ => return Err(ShareError::not_found(NotFoundKind::Parent, address.uri())),
        };
        if request.metadata.validate().is_err() {
            return Err(ShareError::PreconditionFailed(format!(
                "invalid metadata supplied for {}",
                address
            )));
        }

        let now = Utc::now();
        let requested = request.properties;
        let time_or_now = |tag: PropertyTag| {
            requested
                .get(tag)
                .cloned()
                .unwrap_or(PropertyValue::Time(now))
        };
        let default_attributes = match request.kind {
            ItemKind::Directory => NtfsAttributes::DIRECTORY,
            ItemKind::File => NtfsAttributes::ARCHIVE,
        };
        let attributes = requested
            .get(PropertyTag::NtfsAttributes)
            .cloned()
            .unwrap_or(PropertyValue::Attributes(default_attributes));
        let permission_key = match requested.get(PropertyTag::Permission) {
            Some(PropertyValue::Text(sddl)) => permission_key_for(sddl),
            _ => requested
                .get(PropertyTag::PermissionKey)
                .and_then(PropertyValue::as_text)
                .map(str::to_string)
                .unwrap_or_else(|| permission_key_for(DEFAULT_PERMISSION)),
        };

        let mut properties = PropertyValues::new()
            .with(PropertyTag::FileId, PropertyValue::Text(file_id.to_string()))
            .with(PropertyTag::ParentId, PropertyValue::Text(parent_id))
            .with(PropertyTag::CreationTime, time_or_now(PropertyTag::CreationTime))
            .with(PropertyTag::LastWriteTime, time_or_now(PropertyTag::LastWriteTime))
            .with(
                PropertyTag::NtfsAttributes,
                with_directory_flag(request.kind, attributes),
            )
            .with(PropertyTag::PermissionKey, PropertyValue::Text(permission_key));
        if request.kind == ItemKind::File {
            let length = requested
                .get(PropertyTag::ContentLength)
                .cloned()
                .unwrap_or(PropertyValue::Length(0));
            properties.insert(PropertyTag::ContentLength, length);
            for tag in CONTENT_HEADERS {
                if let Some(value) = requested.get(tag) {
                    properties.insert(tag, value.clone());
                }
            }
        }
        touch(&mut properties, etag, now);

        share.tree.insert(
            address.segments().to_vec(),
            StoredResource {
                kind: request.kind,
                properties: properties.clone(),
                metadata: request.metadata,
            },
        );
        Ok(properties)
    }

    async fn delete_resource(&self, address: &ShareAddress, kind: ItemKind) -> Result<()> {
        self.round_trip("delete", address).await;
        let mut state = self.state.write();
        let share = state.share_mut(address)?;
        if address.is_root() {
            return Err(ShareError::InvalidOperation(
                "the share root directory cannot be deleted".to_string(),
            ));
        }
        lookup(&share.tree, address, kind)?;

        let key = address.segments();
        let has_children = share
            .tree
            .keys()
            .any(|k| k.len() > key.len() && k.starts_with(key));
        if has_children {
            return Err(ShareError::conflict(
                ConflictKind::DirectoryNotEmpty,
                address.uri(),
            ));
        }
        share.tree.remove(key);
        share.handles.retain(|_, handle| handle.path != key);
        Ok(())
    }

    async fn fetch_resource(
        &self,
        address: &ShareAddress,
        kind: ItemKind,
        snapshot: SnapshotTime,
    ) -> Result<FetchedResource> {
        self.round_trip("fetch", address).await;
        let state = self.state.read();
        let tree = state.tree(address, snapshot)?;
        let resource = lookup(tree, address, kind)?;
        Ok(FetchedResource {
            kind: resource.kind,
            properties: resource.properties.clone(),
            metadata: resource.metadata.clone(),
        })
    }

    async fn set_properties(
        &self,
        address: &ShareAddress,
        kind: ItemKind,
        properties: PropertyValues,
    ) -> Result<PropertyValues> {
        self.round_trip("set_properties", address).await;
        let mut state = self.state.write();
        let etag = state.next_etag();
        let share = state.share_mut(address)?;
        lookup(&share.tree, address, kind)?;

        if properties.contains(PropertyTag::Permission)
            && properties.contains(PropertyTag::PermissionKey)
        {
            return Err(ShareError::InvalidArgument(
                "permission and permission key are mutually exclusive".to_string(),
            ));
        }
        for (tag, _) in properties.iter() {
            if !tag.is_mutable() {
                return Err(ShareError::InvalidArgument(format!(
                    "property {} cannot be set",
                    tag
                )));
            }
            if kind == ItemKind::Directory
                && (tag == PropertyTag::ContentLength || CONTENT_HEADERS.contains(&tag))
            {
                return Err(ShareError::InvalidArgument(format!(
                    "property {} does not apply to directories",
                    tag
                )));
            }
        }

        let resource = share
            .tree
            .get_mut(address.segments())
            .ok_or_else(|| ShareError::not_found(NotFoundKind::Resource, address.uri()))?;
        for (tag, value) in properties.iter() {
            match (tag, value) {
                (PropertyTag::Permission, PropertyValue::Text(sddl)) => {
                    resource.properties.insert(
                        PropertyTag::PermissionKey,
                        PropertyValue::Text(permission_key_for(sddl)),
                    );
                }
                (PropertyTag::NtfsAttributes, value) => {
                    resource
                        .properties
                        .insert(tag, with_directory_flag(kind, value.clone()));
                }
                (tag, value) => {
                    resource.properties.insert(tag, value.clone());
                }
            }
        }
        touch(&mut resource.properties, etag, Utc::now());
        Ok(resource.properties.clone())
    }

    async fn set_metadata(
        &self,
        address: &ShareAddress,
        kind: ItemKind,
        metadata: &MetadataMap,
    ) -> Result<()> {
        self.round_trip("set_metadata", address).await;
        if metadata.validate().is_err() {
            return Err(ShareError::PreconditionFailed(format!(
                "invalid metadata supplied for {}",
                address
            )));
        }
        let mut state = self.state.write();
        let etag = state.next_etag();
        let share = state.share_mut(address)?;
        lookup(&share.tree, address, kind)?;
        let resource = share
            .tree
            .get_mut(address.segments())
            .ok_or_else(|| ShareError::not_found(NotFoundKind::Resource, address.uri()))?;
        resource.metadata = metadata.clone();
        touch(&mut resource.properties, etag, Utc::now());
        Ok(())
    }

    async fn list_children(
        &self,
        address: &ShareAddress,
        snapshot: SnapshotTime,
        prefix: Option<&str>,
        page_size_hint: Option<u32>,
        token: Option<&ContinuationToken>,
    ) -> Result<Segment<ListEntry>> {
        self.round_trip("list_children", address).await;
        let marker = check_token(token, TokenKind::Listing)?;
        let page_size = match page_size_hint {
            Some(0) => {
                return Err(ShareError::InvalidArgument(
                    "page size must be greater than zero".to_string(),
                ))
            }
            Some(n) => n.min(MAX_LIST_PAGE_SIZE),
            None => MAX_LIST_PAGE_SIZE,
        } as usize;

        let state = self.state.read();
        let tree = state.tree(address, snapshot)?;
        lookup(tree, address, ItemKind::Directory)?;

        let key = address.segments();
        let mut children = tree
            .iter()
            .filter(|(k, _)| k.len() == key.len() + 1 && k.starts_with(key))
            .filter_map(|(k, resource)| k.last().map(|name| (name, resource)))
            .filter(|(name, _)| prefix.map_or(true, |p| name.starts_with(p)))
            .filter(|(name, _)| marker.map_or(true, |m| name.as_str() >= m));

        let mut entries = Vec::new();
        for (name, resource) in children.by_ref().take(page_size) {
            let mut properties = PropertyValues::new();
            for tag in [PropertyTag::FileId, PropertyTag::ContentLength] {
                if let Some(value) = resource.properties.get(tag) {
                    properties.insert(tag, value.clone());
                }
            }
            entries.push(ListEntry {
                name: name.clone(),
                kind: resource.kind,
                properties,
            });
        }
        let continuation = children.next().map(|(next, _)| {
            let token = ContinuationToken::new(TokenKind::Listing, next.clone());
            match marker {
                Some(m) => token.with_marker(m),
                None => token,
            }
        });
        debug!(
            uri = %address,
            returned = entries.len(),
            more = continuation.is_some(),
            "Served listing page"
        );
        Ok(Segment::new(entries, continuation))
    }

    async fn list_open_handles(
        &self,
        address: &ShareAddress,
        snapshot: SnapshotTime,
        recursive: bool,
        page_size_hint: Option<u32>,
        token: Option<&ContinuationToken>,
    ) -> Result<Segment<HandleInfo>> {
        self.round_trip("list_handles", address).await;
        let marker = check_token(token, TokenKind::Handles)?;
        let page_size = page_size_hint
            .unwrap_or(self.handle_page_size)
            .clamp(1, self.handle_page_size) as usize;

        let state = self.state.read();
        let tree = state.tree(address, snapshot)?;
        lookup_any(tree, address)?;
        if snapshot.is_some() {
            return Ok(Segment::new(
                Vec::new(),
                Some(ContinuationToken::new(TokenKind::Handles, "")),
            ));
        }
        let share = state.share(address)?;

        let mut matching = share
            .handles
            .values()
            .filter(|h| handle_in_scope(h, address.segments(), recursive))
            .filter(|h| marker.map_or(true, |m| h.id.as_str() >= m));
        let handles: Vec<HandleInfo> = matching
            .by_ref()
            .take(page_size)
            .map(|h| Self::handle_info(&share.tree, h))
            .collect();
        let next_marker = matching.next().map(|h| h.id.clone()).unwrap_or_default();
        Ok(Segment::new(
            handles,
            Some(ContinuationToken::new(TokenKind::Handles, next_marker)),
        ))
    }

    async fn close_handles(
        &self,
        address: &ShareAddress,
        snapshot: SnapshotTime,
        target: &HandleTarget,
        recursive: bool,
        token: Option<&ContinuationToken>,
    ) -> Result<CloseHandlesPage> {
        self.round_trip("close_handles", address).await;
        let marker = check_token(token, TokenKind::CloseHandles)?;

        let mut state = self.state.write();
        lookup_any(state.tree(address, snapshot)?, address)?;
        if snapshot.is_some() {
            return Ok(CloseHandlesPage {
                closed_count: 0,
                failed_count: 0,
                continuation: None,
            });
        }
        let page_size = self.handle_page_size as usize;
        let share = state.share_mut(address)?;
        let scope = address.segments();

        let (to_close, next_marker): (Vec<String>, Option<String>) = match target {
            HandleTarget::Id(id) => {
                let in_scope = share
                    .handles
                    .get(id)
                    .map_or(false, |h| handle_in_scope(h, scope, true));
                (if in_scope { vec![id.clone()] } else { Vec::new() }, None)
            }
            HandleTarget::All => {
                let mut matching = share
                    .handles
                    .values()
                    .filter(|h| handle_in_scope(h, scope, recursive))
                    .filter(|h| marker.map_or(true, |m| h.id.as_str() >= m))
                    .map(|h| h.id.clone());
                let page: Vec<String> = matching.by_ref().take(page_size).collect();
                (page, matching.next())
            }
        };
        for id in &to_close {
            share.handles.remove(id);
        }
        debug!(
            uri = %address,
            handles = %target,
            closed = to_close.len(),
            "Closed handles"
        );
        Ok(CloseHandlesPage {
            closed_count: to_close.len() as u32,
            failed_count: 0,
            continuation: next_marker.map(|m| ContinuationToken::new(TokenKind::CloseHandles, m)),
        })
    }
}
