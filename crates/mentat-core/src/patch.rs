//! Field-by-field update of a stored entry.
//!
//! Every mutable field is an `Option`: `None` leaves the stored value
//! untouched. Empty strings and empty tag lists coming off the wire are
//! normalized to `None`, so a field cannot be cleared through Update.

use chrono::{DateTime, Utc};

use crate::error::EntryError;
use crate::models::{Entry, EntryType, PostMetadata, UpdateEntryArgs};
use crate::validation::{
    next_modified, non_empty, normalize_tags, normalize_todo_status, parse_timestamp,
    validate_priority,
};

/// Validated set of changes to apply to one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub kind: Option<EntryType>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub scheduled: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Option<String>,
    pub todo_status: Option<String>,
    pub metadata: Option<PostMetadata>,
}

impl EntryPatch {
    /// Validate and normalize the mutable fields of an Update call.
    ///
    /// Fields are checked in wire order. A malformed timestamp is a hard
    /// error; an unknown type or malformed priority is a soft rejection.
    pub fn from_args(args: &UpdateEntryArgs) -> Result<Self, EntryError> {
        let mut patch = EntryPatch::default();

        if let Some(kind) = non_empty(args.kind.clone()) {
            patch.kind = Some(kind.parse::<EntryType>()?);
        }

        patch.content = non_empty(args.content.clone());

        patch.tags = args
            .tags
            .as_ref()
            .map(|tags| normalize_tags(tags))
            .filter(|tags| !tags.is_empty());

        if let Some(raw) = non_empty(args.scheduled.clone()) {
            patch.scheduled = Some(parse_timestamp(&raw)?);
        }

        if let Some(raw) = non_empty(args.deadline.clone()) {
            patch.deadline = Some(parse_timestamp(&raw)?);
        }

        if let Some(raw) = non_empty(args.priority.clone()) {
            patch.priority = Some(validate_priority(&raw)?);
        }

        patch.todo_status = non_empty(args.todo_status.clone()).map(|s| normalize_todo_status(&s));

        patch.metadata = args.metadata.clone().and_then(PostMetadata::into_option);

        Ok(patch)
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        *self == EntryPatch::default()
    }

    /// Overwrite supplied fields and refresh `modified_at`.
    ///
    /// `uuid` and `added_at` are never touched.
    pub fn apply(self, entry: &mut Entry) {
        if let Some(kind) = self.kind {
            entry.kind = kind;
        }
        if let Some(content) = self.content {
            entry.content = content;
        }
        if let Some(tags) = self.tags {
            entry.tags = tags;
        }
        if let Some(scheduled) = self.scheduled {
            entry.scheduled = Some(scheduled);
        }
        if let Some(deadline) = self.deadline {
            entry.deadline = Some(deadline);
        }
        if let Some(priority) = self.priority {
            entry.priority = Some(priority);
        }
        if let Some(todo_status) = self.todo_status {
            entry.todo_status = Some(todo_status);
        }
        if let Some(metadata) = self.metadata {
            entry.metadata = Some(metadata);
        }
        entry.modified_at = next_modified(entry.modified_at);
    }
}
