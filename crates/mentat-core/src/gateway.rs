//! Entry store gateway.
//!
//! Exposes the six entry operations as request/response pairs on top of an
//! [`EntryStore`]. Domain failures are rendered into the response's
//! `message`/`error` field; only hard failures (malformed timestamps) come
//! back as `Err`.
//!
//! # Concurrency
//!
//! The gateway holds no locks. Add's duplicate check and insert are two store
//! calls; two concurrent Adds with the same content can both pass the check,
//! and the store's uniqueness constraint decides which insert wins (the loser
//! reports "Already exists, skipping").
//!
//! Update persists with an upsert keyed by uuid, so an entry removed between
//! the lookup and the write is recreated rather than reported missing.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::defaults::{BATCH_DELETE_THRESHOLD, ENTRY_TYPES, FAILED_ID_SEPARATOR};
use crate::error::{DomainError, EntryError, Error, Result};
use crate::filter::EntryFilter;
use crate::models::{
    AddEntryArgs, AddResponse, CleanupArgs, CleanupResponse, DeleteEntryArgs, DeleteResponse,
    Entry, EntryType, SearchEntryArgs, SearchResponse, StatsArgs, StatsResponse, UpdateEntryArgs,
    UpdateResponse, UserId,
};
use crate::patch::EntryPatch;
use crate::traits::EntryStore;
use crate::validation::{
    format_timestamp, normalize_tags, normalize_todo_status, now, parse_timestamp,
    validate_priority,
};

/// Message returned by a successful Update.
pub const UPDATED: &str = "updated";

/// Entry-scoped operations over a shared store handle.
#[derive(Clone)]
pub struct EntryGateway {
    store: Arc<dyn EntryStore>,
}

impl EntryGateway {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    // =========================================================================
    // ADD
    // =========================================================================

    /// Create an entry unless one with the same content already exists.
    ///
    /// On success the message is the new entry's uuid.
    pub async fn add(&self, args: AddEntryArgs) -> Result<AddResponse> {
        let message = settle("add", self.try_add(args).await.map(|id| id.to_string()))?;
        Ok(AddResponse { message })
    }

    async fn try_add(&self, args: AddEntryArgs) -> std::result::Result<Uuid, EntryError> {
        let user = UserId::parse(&args.user_id)?;
        let kind: EntryType = args.kind.parse()?;
        if args.content.is_empty() {
            return Err(DomainError::EmptyContent.into());
        }

        info!(
            subsystem = "gateway",
            op = "add",
            user_id = %user,
            entry_type = %kind,
            "received '{}' entry: '{}'",
            kind,
            args.content
        );

        match self
            .store
            .find_one(&user, &EntryFilter::by_content(&args.content))
            .await
        {
            Ok(_) => return Err(DomainError::AlreadyExists.into()),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(store_failure("add", "store error", &e)),
        }

        let entry = build_entry(&args, kind)?;

        match self.store.insert(&user, &entry).await {
            Ok(()) => {
                debug!(
                    subsystem = "gateway",
                    op = "add",
                    user_id = %user,
                    entry_uuid = %entry.uuid,
                    "Entry stored"
                );
                Ok(entry.uuid)
            }
            Err(e) if e.is_duplicate() => Err(DomainError::AlreadyExists.into()),
            Err(e) => Err(store_failure("add", "failed to insert entry", &e)),
        }
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Overwrite the supplied fields of the entry named by `uuid`.
    pub async fn update(&self, args: UpdateEntryArgs) -> Result<UpdateResponse> {
        let message = settle(
            "update",
            self.try_update(args).await.map(|()| UPDATED.to_string()),
        )?;
        Ok(UpdateResponse { message })
    }

    async fn try_update(&self, args: UpdateEntryArgs) -> std::result::Result<(), EntryError> {
        let user = UserId::parse(&args.user_id)?;
        if args.uuid.is_empty() {
            return Err(DomainError::UuidMissing.into());
        }
        // A malformed identifier cannot name a stored entry.
        let uuid = Uuid::parse_str(&args.uuid).map_err(|_| DomainError::UnknownUuid)?;

        let mut entry = match self
            .store
            .find_one(&user, &EntryFilter::by_uuid(uuid))
            .await
        {
            Ok(entry) => entry,
            Err(e) if e.is_not_found() => return Err(DomainError::UnknownUuid.into()),
            Err(e) => return Err(store_failure("update", "store error", &e)),
        };

        let patch = EntryPatch::from_args(&args)?;
        if patch.is_empty() {
            debug!(
                subsystem = "gateway",
                op = "update",
                entry_uuid = %uuid,
                "No fields supplied, refreshing modification time only"
            );
        }
        patch.apply(&mut entry);

        self.store
            .upsert(&user, uuid, &entry)
            .await
            .map_err(|e| store_failure("update", "update failed", &e))?;

        info!(
            subsystem = "gateway",
            op = "update",
            user_id = %user,
            entry_uuid = %uuid,
            "Entry updated"
        );
        Ok(())
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Remove entries by uuid.
    ///
    /// More than [`BATCH_DELETE_THRESHOLD`] identifiers are removed with one
    /// set-based call; fewer are removed one at a time and failures collected.
    pub async fn delete(&self, args: DeleteEntryArgs) -> DeleteResponse {
        let user = match UserId::parse(&args.user_id) {
            Ok(user) => user,
            Err(e) => return DeleteResponse::failed(-1, e),
        };
        if args.uuids.is_empty() {
            return DeleteResponse::failed(-1, DomainError::NoUuids);
        }

        let start = Instant::now();
        let response = if args.uuids.len() > BATCH_DELETE_THRESHOLD {
            self.delete_bulk(&user, &args.uuids).await
        } else {
            self.delete_each(&user, &args.uuids).await
        };

        debug!(
            subsystem = "gateway",
            op = "delete",
            user_id = %user,
            requested_count = args.uuids.len(),
            deleted_count = response.deleted_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Delete finished"
        );
        response
    }

    async fn delete_bulk(&self, user: &UserId, raw_ids: &[String]) -> DeleteResponse {
        // Malformed identifiers cannot match anything and are skipped.
        let ids: Vec<Uuid> = raw_ids
            .iter()
            .filter_map(|raw| Uuid::parse_str(raw).ok())
            .collect();

        match self.store.remove_all(user, &EntryFilter::UuidIn(ids)).await {
            Ok(removed) => DeleteResponse::deleted(to_count(removed)),
            Err(e) => DeleteResponse::failed(-1, store_failure("delete", "cleanup failed", &e)),
        }
    }

    async fn delete_each(&self, user: &UserId, raw_ids: &[String]) -> DeleteResponse {
        let mut deleted = 0i64;
        let mut failed: Vec<&str> = Vec::new();

        for raw in raw_ids {
            let removed = match Uuid::parse_str(raw) {
                Ok(uuid) => self
                    .store
                    .remove_one(user, &EntryFilter::by_uuid(uuid))
                    .await
                    .is_ok(),
                Err(_) => false,
            };
            trace!(
                subsystem = "gateway",
                op = "delete",
                entry_uuid = %raw,
                removed,
                "Per-item removal"
            );
            if removed {
                deleted += 1;
            } else {
                failed.push(raw);
            }
        }

        if failed.is_empty() {
            DeleteResponse::deleted(deleted)
        } else {
            DeleteResponse::failed(
                deleted,
                format!(
                    "failed to delete entries: {}",
                    failed.join(FAILED_ID_SEPARATOR)
                ),
            )
        }
    }

    // =========================================================================
    // CLEANUP
    // =========================================================================

    /// Remove every entry of the given types (all known types by default).
    pub async fn cleanup(&self, args: CleanupArgs) -> CleanupResponse {
        let user = match UserId::parse(&args.user_id) {
            Ok(user) => user,
            Err(e) => return CleanupResponse::failed(0, e),
        };

        let filter = EntryFilter::type_in_or_default(&args.types, ENTRY_TYPES);
        match self.store.remove_all(&user, &filter).await {
            Ok(removed) => {
                info!(
                    subsystem = "gateway",
                    op = "cleanup",
                    user_id = %user,
                    deleted_count = removed,
                    "Collection cleaned up"
                );
                CleanupResponse::deleted(to_count(removed))
            }
            Err(e) => CleanupResponse::failed(0, store_failure("cleanup", "cleanup failed", &e)),
        }
    }

    // =========================================================================
    // STATS
    // =========================================================================

    /// Count entries overall and, when `detailed`, per type.
    pub async fn stats(&self, args: StatsArgs) -> StatsResponse {
        let mut stats = StatsResponse::default();
        let user = match UserId::parse(&args.user_id) {
            Ok(user) => user,
            Err(e) => {
                stats.error = e.to_string();
                return stats;
            }
        };

        match self.store.count(&user, &EntryFilter::All).await {
            Ok(n) => stats.whole = to_count(n),
            Err(e) => {
                stats.error = store_failure("stats", "failed getting stats/whole count", &e)
                    .to_string();
                return stats;
            }
        }

        if !args.detailed {
            return stats;
        }

        for kind in EntryType::ALL {
            let filter = EntryFilter::TypeIn(vec![kind.as_str().to_string()]);
            match self.store.count(&user, &filter).await {
                Ok(n) => *stats.slot_mut(kind) = to_count(n),
                Err(e) => {
                    stats.error = format!(
                        "failed getting stats/{} count: {}",
                        stats_label(kind),
                        e
                    );
                    warn!(
                        subsystem = "gateway",
                        op = "stats",
                        user_id = %user,
                        entry_type = %kind,
                        error = %e,
                        "Per-type count failed"
                    );
                    return stats;
                }
            }
        }
        stats
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Find entries matching every supplied criterion.
    pub async fn search(&self, args: SearchEntryArgs) -> SearchResponse {
        let user = match UserId::parse(&args.user_id) {
            Ok(user) => user,
            Err(e) => return SearchResponse::failed(e),
        };

        let filter = EntryFilter::search(
            &args.types,
            &args.content,
            &args.tags,
            &args.priority,
            ENTRY_TYPES,
        );
        debug!(
            subsystem = "gateway",
            op = "search",
            user_id = %user,
            filter = ?filter,
            "Search filter built"
        );

        let start = Instant::now();
        match self.store.find(&user, &filter).await {
            Ok(entries) => {
                debug!(
                    subsystem = "gateway",
                    op = "search",
                    user_id = %user,
                    result_count = entries.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Search finished"
                );
                SearchResponse::found(entries)
            }
            Err(e) if e.is_not_found() => SearchResponse::found(Vec::new()),
            Err(e) => SearchResponse::failed(store_failure("search", "store error", &e)),
        }
    }
}

/// Build a fresh entry from Add arguments.
///
/// Field processing order: tags, scheduled, deadline, timestamps, priority,
/// todo status, metadata, uuid. A malformed timestamp therefore wins over a
/// malformed priority.
fn build_entry(args: &AddEntryArgs, kind: EntryType) -> std::result::Result<Entry, EntryError> {
    let tags = normalize_tags(&args.tags);

    let scheduled = optional_timestamp(&args.scheduled)?;
    let deadline = optional_timestamp(&args.deadline)?;
    if let Some(ts) = scheduled.as_ref().or(deadline.as_ref()) {
        trace!(subsystem = "gateway", op = "add", at = %format_timestamp(ts), "Entry is dated");
    }

    let stamp = now();

    let priority = if args.priority.is_empty() {
        None
    } else {
        Some(validate_priority(&args.priority)?)
    };

    let todo_status = if args.todo_status.is_empty() {
        None
    } else {
        Some(normalize_todo_status(&args.todo_status))
    };

    Ok(Entry {
        uuid: Uuid::new_v4(),
        kind,
        content: args.content.clone(),
        tags,
        scheduled,
        deadline,
        added_at: stamp,
        modified_at: stamp,
        priority,
        todo_status,
        metadata: args.metadata.clone().into_option(),
    })
}

fn optional_timestamp(raw: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    if raw.is_empty() {
        Ok(None)
    } else {
        parse_timestamp(raw).map(Some)
    }
}

/// Log a store failure and turn it into a soft, prefixed message.
fn store_failure(op: &'static str, context: &'static str, err: &Error) -> EntryError {
    warn!(subsystem = "gateway", op, error = %err, "{}", context);
    DomainError::store(context, err).into()
}

/// Resolve a gateway outcome into a response message, propagating fatal
/// errors.
fn settle(op: &'static str, outcome: std::result::Result<String, EntryError>) -> Result<String> {
    match outcome {
        Ok(message) => Ok(message),
        Err(EntryError::Domain(e)) => {
            info!(subsystem = "gateway", op, reason = %e, "Request rejected");
            Ok(e.to_string())
        }
        Err(EntryError::Fatal(e)) => {
            warn!(subsystem = "gateway", op, error = %e, "Request failed");
            Err(e)
        }
    }
}

/// Stats labels use the plural for bookmarks.
fn stats_label(kind: EntryType) -> &'static str {
    match kind {
        EntryType::Bookmark => "bookmarks",
        EntryType::Pim => "pim",
        EntryType::Org => "org",
    }
}

fn to_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
