//! Fileshare: client-side namespace engine for SMB-style file shares
//!
//! Models a share as a tree of directories and files addressed by URI, tracks
//! confirmed versus staged properties per node, drives paged listings and handle
//! operations through opaque continuation tokens, and rejects writes against
//! read-only share snapshots before any request is sent.
//!
//! All remote work goes through a [`ServiceEndpoint`](endpoint::ServiceEndpoint);
//! [`InMemoryShareService`](endpoint::InMemoryShareService) emulates the service
//! in-process.

pub mod address;
pub mod attributes;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod node;
pub mod properties;
pub mod segment;
pub mod share;

pub use address::ShareAddress;
pub use attributes::NtfsAttributes;
pub use client::ShareServiceClient;
pub use config::{ClientConfig, ConfigLoader};
pub use endpoint::{InMemoryShareService, ItemKind, ServiceEndpoint};
pub use error::{ConflictKind, NotFoundKind, Result, ShareError};
pub use metadata::MetadataMap;
pub use node::{DirectoryNode, FileNode, HandleOptions, ListItem, ListOptions};
pub use properties::{PropertySet, PropertyTag, PropertyValue};
pub use segment::{ContinuationToken, Segment, SegmentedEnumerator, TokenKind};
pub use share::Share;
