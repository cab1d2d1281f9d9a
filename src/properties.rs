//! Two-phase property tracking
//!
//! A [`PropertySet`] keeps the values last confirmed by the service apart from
//! values staged locally for the next create or set-properties call. Staged
//! values are never visible through the confirmed accessors; a successful round
//! trip replaces confirmed values from the response and clears every staged slot.

use crate::attributes::NtfsAttributes;
use crate::error::{Result, ShareError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute tracked for a directory or file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyTag {
    CreationTime,
    LastWriteTime,
    ChangeTime,
    NtfsAttributes,
    PermissionKey,
    /// Literal security descriptor, submitted instead of a permission key
    Permission,
    FileId,
    ParentId,
    ETag,
    LastModified,
    ContentLength,
    ContentType,
    ContentEncoding,
    ContentLanguage,
    CacheControl,
    ContentDisposition,
    ContentMd5,
}

impl PropertyTag {
    /// Whether callers may stage a value for this tag. Server-assigned tags are read-only.
    pub fn is_mutable(self) -> bool {
        !matches!(
            self,
            PropertyTag::ChangeTime
                | PropertyTag::FileId
                | PropertyTag::ParentId
                | PropertyTag::ETag
                | PropertyTag::LastModified
        )
    }

    fn accepts(self, value: &PropertyValue) -> bool {
        match self {
            PropertyTag::CreationTime
            | PropertyTag::LastWriteTime
            | PropertyTag::ChangeTime
            | PropertyTag::LastModified => matches!(value, PropertyValue::Time(_)),
            PropertyTag::NtfsAttributes => matches!(value, PropertyValue::Attributes(_)),
            PropertyTag::ContentLength => matches!(value, PropertyValue::Length(_)),
            _ => matches!(value, PropertyValue::Text(_)),
        }
    }
}

impl fmt::Display for PropertyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    Time(DateTime<Utc>),
    Attributes(NtfsAttributes),
    Length(u64),
    Text(String),
}

impl PropertyValue {
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_attributes(&self) -> Option<NtfsAttributes> {
        match self {
            PropertyValue::Attributes(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_length(&self) -> Option<u64> {
        match self {
            PropertyValue::Length(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Tag-keyed property values, used both for staged updates and for service responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValues(BTreeMap<PropertyTag, PropertyValue>);

impl PropertyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, tag: PropertyTag, value: PropertyValue) -> Self {
        self.0.insert(tag, value);
        self
    }

    pub fn insert(&mut self, tag: PropertyTag, value: PropertyValue) -> Option<PropertyValue> {
        self.0.insert(tag, value)
    }

    pub fn get(&self, tag: PropertyTag) -> Option<&PropertyValue> {
        self.0.get(&tag)
    }

    pub fn remove(&mut self, tag: PropertyTag) -> Option<PropertyValue> {
        self.0.remove(&tag)
    }

    pub fn contains(&self, tag: PropertyTag) -> bool {
        self.0.contains_key(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyTag, &PropertyValue)> {
        self.0.iter().map(|(tag, value)| (*tag, value))
    }

    pub fn tags(&self) -> Vec<PropertyTag> {
        self.0.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn time(&self, tag: PropertyTag) -> Option<DateTime<Utc>> {
        self.get(tag).and_then(PropertyValue::as_time)
    }

    fn text(&self, tag: PropertyTag) -> Option<&str> {
        self.get(tag).and_then(PropertyValue::as_text)
    }
}

/// Confirmed and pending property slots for one node.
///
/// Not internally synchronized: one owner per node instance.
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    confirmed: PropertyValues,
    pending: PropertyValues,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_confirmed(confirmed: PropertyValues) -> Self {
        Self {
            confirmed,
            pending: PropertyValues::new(),
        }
    }

    /// Stage a value for the next create or set-properties call.
    pub fn stage(&mut self, tag: PropertyTag, value: PropertyValue) -> Result<()> {
        if !tag.is_mutable() {
            return Err(ShareError::InvalidArgument(format!(
                "property {} is assigned by the service and cannot be set",
                tag
            )));
        }
        if !tag.accepts(&value) {
            return Err(ShareError::InvalidArgument(format!(
                "value {:?} has the wrong type for property {}",
                value, tag
            )));
        }
        self.pending.insert(tag, value);
        Ok(())
    }

    /// Drop a single staged value without touching confirmed state.
    pub fn unstage(&mut self, tag: PropertyTag) -> Option<PropertyValue> {
        self.pending.remove(tag)
    }

    pub fn confirmed(&self, tag: PropertyTag) -> Option<&PropertyValue> {
        self.confirmed.get(tag)
    }

    pub fn pending(&self, tag: PropertyTag) -> Option<&PropertyValue> {
        self.pending.get(tag)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_values(&self) -> &PropertyValues {
        &self.pending
    }

    pub fn confirmed_values(&self) -> &PropertyValues {
        &self.confirmed
    }

    /// Check the staged subset before it is submitted.
    pub fn validate_pending(&self) -> Result<()> {
        if self.pending.contains(PropertyTag::PermissionKey)
            && self.pending.contains(PropertyTag::Permission)
        {
            return Err(ShareError::InvalidArgument(
                "permission and permission key cannot both be set".to_string(),
            ));
        }
        Ok(())
    }

    /// Merge a create/set-properties response into the confirmed slots and clear all
    /// pending slots, including ones for tags the response did not mention.
    pub fn commit_from_server(&mut self, response: PropertyValues) {
        for (tag, value) in response.0 {
            self.confirmed.insert(tag, value);
        }
        self.pending = PropertyValues::new();
    }

    /// Replace confirmed state wholesale from a fetch response; pending is discarded.
    pub fn replace_from_server(&mut self, response: PropertyValues) {
        self.confirmed = response;
        self.pending = PropertyValues::new();
    }

    pub fn clear_pending(&mut self) {
        self.pending = PropertyValues::new();
    }

    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.confirmed.time(PropertyTag::CreationTime)
    }

    pub fn last_write_time(&self) -> Option<DateTime<Utc>> {
        self.confirmed.time(PropertyTag::LastWriteTime)
    }

    pub fn change_time(&self) -> Option<DateTime<Utc>> {
        self.confirmed.time(PropertyTag::ChangeTime)
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.confirmed.time(PropertyTag::LastModified)
    }

    pub fn ntfs_attributes(&self) -> Option<NtfsAttributes> {
        self.confirmed
            .get(PropertyTag::NtfsAttributes)
            .and_then(PropertyValue::as_attributes)
    }

    pub fn permission_key(&self) -> Option<&str> {
        self.confirmed.text(PropertyTag::PermissionKey)
    }

    pub fn file_id(&self) -> Option<&str> {
        self.confirmed.text(PropertyTag::FileId)
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.confirmed.text(PropertyTag::ParentId)
    }

    pub fn etag(&self) -> Option<&str> {
        self.confirmed.text(PropertyTag::ETag)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.confirmed
            .get(PropertyTag::ContentLength)
            .and_then(PropertyValue::as_length)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.confirmed.text(PropertyTag::ContentType)
    }

    pub fn cache_control(&self) -> Option<&str> {
        self.confirmed.text(PropertyTag::CacheControl)
    }

    pub fn set_creation_time(&mut self, time: DateTime<Utc>) {
        self.pending
            .insert(PropertyTag::CreationTime, PropertyValue::Time(time));
    }

    pub fn set_last_write_time(&mut self, time: DateTime<Utc>) {
        self.pending
            .insert(PropertyTag::LastWriteTime, PropertyValue::Time(time));
    }

    pub fn set_ntfs_attributes(&mut self, attributes: NtfsAttributes) {
        self.pending.insert(
            PropertyTag::NtfsAttributes,
            PropertyValue::Attributes(attributes),
        );
    }

    pub fn set_permission_key(&mut self, key: impl Into<String>) {
        self.pending
            .insert(PropertyTag::PermissionKey, PropertyValue::Text(key.into()));
    }

    pub fn set_permission(&mut self, sddl: impl Into<String>) {
        self.pending
            .insert(PropertyTag::Permission, PropertyValue::Text(sddl.into()));
    }

    pub fn set_content_length(&mut self, length: u64) {
        self.pending
            .insert(PropertyTag::ContentLength, PropertyValue::Length(length));
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.pending.insert(
            PropertyTag::ContentType,
            PropertyValue::Text(content_type.into()),
        );
    }

    pub fn set_cache_control(&mut self, cache_control: impl Into<String>) {
        self.pending.insert(
            PropertyTag::CacheControl,
            PropertyValue::Text(cache_control.into()),
        );
    }
}
