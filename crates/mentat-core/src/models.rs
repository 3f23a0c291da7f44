//! Entry data model and the argument/response records of every operation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::defaults::COUNT_UNKNOWN;
use crate::error::DomainError;

// =============================================================================
// ENTRY
// =============================================================================

/// Closed set of entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Personal information management note.
    Pim,
    /// Saved link.
    Bookmark,
    /// Outline/org-mode item.
    Org,
}

impl EntryType {
    /// All entry types, in the order Stats reports them.
    pub const ALL: [EntryType; 3] = [EntryType::Bookmark, EntryType::Pim, EntryType::Org];

    /// Wire/storage name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Pim => "pim",
            EntryType::Bookmark => "bookmark",
            EntryType::Org => "org",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(DomainError::TypeMissing),
            "pim" => Ok(EntryType::Pim),
            "bookmark" => Ok(EntryType::Bookmark),
            "org" => Ok(EntryType::Org),
            _ => Err(DomainError::UnknownType),
        }
    }
}

/// Provenance metadata attached to bookmark-like entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub time_added_origin: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hash_origin: String,
    #[serde(deserialize_with = "null_as_default")]
    pub meta_origin: String,
    #[serde(deserialize_with = "null_as_default")]
    pub from: String,
}

impl PostMetadata {
    /// True when every field holds its default (empty) value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `Some(self)` unless the record is empty.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// The persisted unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Stable external handle, assigned at creation and never changed.
    pub uuid: Uuid,
    /// Serialized as `type` to match the wire schema.
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub content: String,
    /// Always lowercase.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub added_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Always uppercase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PostMetadata>,
}

// =============================================================================
// COLLECTION SCOPE
// =============================================================================

/// Non-empty user identifier naming the collection an operation is scoped to.
///
/// Every [`crate::EntryStore`] method takes a `&UserId`, so an operation
/// without a user can never reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Validate a caller-supplied user identifier.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() {
            return Err(DomainError::UserIdMissing);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// OPERATION ARGUMENTS
// =============================================================================

/// Decode an explicit JSON `null` as the field's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Arguments for `entry.Add`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddEntryArgs {
    #[serde(rename = "userID", alias = "userId", deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: PostMetadata,
    #[serde(deserialize_with = "null_as_default")]
    pub scheduled: String,
    #[serde(deserialize_with = "null_as_default")]
    pub deadline: String,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: String,
    #[serde(deserialize_with = "null_as_default")]
    pub todo_status: String,
}

/// Arguments for `entry.Update`.
///
/// Mutable fields are optional; absent or empty values leave the stored
/// value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateEntryArgs {
    #[serde(rename = "userID", alias = "userId", deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todo_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PostMetadata>,
}

/// Arguments for `entry.Delete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteEntryArgs {
    #[serde(rename = "userID", alias = "userId", deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(alias = "UUIDs", deserialize_with = "null_as_default")]
    pub uuids: Vec<String>,
}

/// Arguments for `entry.Cleanup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CleanupArgs {
    #[serde(rename = "userID", alias = "userId", deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub types: Vec<String>,
}

/// Arguments for `entry.Stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsArgs {
    #[serde(rename = "userID", alias = "userId", deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub detailed: bool,
}

/// Arguments for `entry.Search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchEntryArgs {
    #[serde(rename = "userID", alias = "userId", deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub types: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: String,
}

// =============================================================================
// OPERATION RESPONSES
// =============================================================================

/// Response for `entry.Add`: the new uuid on success, otherwise a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResponse {
    pub message: String,
}

/// Response for `entry.Update`: `"updated"` on success, otherwise a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub message: String,
}

/// Response for `entry.Delete` and `entry.Cleanup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub error: String,
    pub deleted_count: i64,
}

impl DeleteResponse {
    pub fn deleted(count: i64) -> Self {
        Self {
            error: String::new(),
            deleted_count: count,
        }
    }

    pub fn failed(count: i64, error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            deleted_count: count,
        }
    }
}

/// Cleanup shares the Delete response shape.
pub type CleanupResponse = DeleteResponse;

/// Response for `entry.Stats`. Counts not computed stay at `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub error: String,
    pub whole: i64,
    pub bookmarks: i64,
    pub pim: i64,
    pub org: i64,
}

impl Default for StatsResponse {
    fn default() -> Self {
        Self {
            error: String::new(),
            whole: COUNT_UNKNOWN,
            bookmarks: COUNT_UNKNOWN,
            pim: COUNT_UNKNOWN,
            org: COUNT_UNKNOWN,
        }
    }
}

impl StatsResponse {
    /// Mutable slot holding the count for one entry type.
    pub fn slot_mut(&mut self, kind: EntryType) -> &mut i64 {
        match kind {
            EntryType::Bookmark => &mut self.bookmarks,
            EntryType::Pim => &mut self.pim,
            EntryType::Org => &mut self.org,
        }
    }
}

/// Response for `entry.Search`. Entries are unordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub error: String,
    pub count: usize,
    pub entries: Vec<Entry>,
}

impl SearchResponse {
    pub fn failed(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            count: 0,
            entries: Vec::new(),
        }
    }

    pub fn found(entries: Vec<Entry>) -> Self {
        Self {
            error: String::new(),
            count: entries.len(),
            entries,
        }
    }
}
