//! Core traits for mentat abstractions.
//!
//! [`EntryStore`] is the document-store driver seam: concrete backends
//! (PostgreSQL, in-memory) implement it, and the gateway depends only on it.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::filter::EntryFilter;
use crate::models::{Entry, UserId};

/// Per-user entry storage.
///
/// Every method is scoped to one user's collection; implementations must
/// never return or touch entries belonging to another user.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// First entry matching `filter`.
    ///
    /// Returns an error for which [`crate::Error::is_not_found`] holds when
    /// nothing matches.
    async fn find_one(&self, user: &UserId, filter: &EntryFilter) -> Result<Entry>;

    /// All entries matching `filter`, in no particular order.
    async fn find(&self, user: &UserId, filter: &EntryFilter) -> Result<Vec<Entry>>;

    /// Insert a new entry.
    ///
    /// Fails with an error for which [`crate::Error::is_duplicate`] holds when
    /// the collection already has an entry with the same content or uuid.
    async fn insert(&self, user: &UserId, entry: &Entry) -> Result<()>;

    /// Replace the entry with `uuid`, creating it if it no longer exists.
    ///
    /// Fails with an error for which [`crate::Error::is_duplicate`] holds when
    /// another entry in the collection already has the same content; the
    /// stored entry is then left unchanged.
    async fn upsert(&self, user: &UserId, uuid: Uuid, entry: &Entry) -> Result<()>;

    /// Remove one entry matching `filter`; not-found when nothing matched.
    async fn remove_one(&self, user: &UserId, filter: &EntryFilter) -> Result<()>;

    /// Remove every entry matching `filter`, returning how many were removed.
    async fn remove_all(&self, user: &UserId, filter: &EntryFilter) -> Result<u64>;

    /// Count entries matching `filter`.
    async fn count(&self, user: &UserId, filter: &EntryFilter) -> Result<u64>;
}
