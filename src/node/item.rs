use super::{DirectoryNode, FileNode};
use crate::address::ShareAddress;
use crate::endpoint::{ItemKind, ListEntry};
use crate::error::Result;
use crate::share::ShareContext;
use std::sync::Arc;

/// One child yielded by a directory listing.
///
/// The wrapped node carries whatever properties the listing reported as confirmed
/// state; metadata is not part of a listing and starts empty.
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    Directory(DirectoryNode),
    File(FileNode),
}

impl ListItem {
    pub(crate) fn from_entry(
        share: &Arc<ShareContext>,
        parent: &ShareAddress,
        entry: ListEntry,
    ) -> Result<Self> {
        let address = parent.resolve(&entry.name)?;
        Ok(match entry.kind {
            ItemKind::Directory => ListItem::Directory(DirectoryNode::with_properties(
                Arc::clone(share),
                address,
                entry.properties,
            )),
            ItemKind::File => ListItem::File(FileNode::with_properties(
                Arc::clone(share),
                address,
                entry.properties,
            )),
        })
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ListItem::Directory(_) => ItemKind::Directory,
            ListItem::File(_) => ItemKind::File,
        }
    }

    pub fn address(&self) -> &ShareAddress {
        match self {
            ListItem::Directory(dir) => dir.address(),
            ListItem::File(file) => file.address(),
        }
    }

    pub fn uri(&self) -> String {
        self.address().uri()
    }

    pub fn name(&self) -> &str {
        self.address().name()
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, ListItem::Directory(_))
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            ListItem::Directory(dir) => Some(dir),
            ListItem::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            ListItem::File(file) => Some(file),
            ListItem::Directory(_) => None,
        }
    }

    pub fn into_directory(self) -> Option<DirectoryNode> {
        match self {
            ListItem::Directory(dir) => Some(dir),
            ListItem::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<FileNode> {
        match self {
            ListItem::File(file) => Some(file),
            ListItem::Directory(_) => None,
        }
    }
}
