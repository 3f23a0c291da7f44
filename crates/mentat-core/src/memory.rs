//! In-memory entry store.
//!
//! Implements [`EntryStore`] over a map of per-user collections. Used by the
//! test suites and for running the service without a database. Failures can
//! be scripted per operation to exercise the gateway's error reporting.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use mentat_core::{EntryGateway, MemoryEntryStore, StoreOp};
//!
//! let store = Arc::new(MemoryEntryStore::new());
//! store.fail_after(StoreOp::Count, 1, "connection reset");
//! let gateway = EntryGateway::new(store);
//! # let _ = gateway;
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::filter::EntryFilter;
use crate::models::{Entry, UserId};
use crate::traits::EntryStore;

/// Store operation a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Find,
    Insert,
    Upsert,
    Remove,
    Count,
}

#[derive(Debug)]
struct FailureRule {
    /// Calls allowed to succeed before the rule fires.
    remaining_ok: usize,
    message: String,
}

/// [`EntryStore`] backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryEntryStore {
    collections: RwLock<HashMap<UserId, Vec<Entry>>>,
    failures: Mutex<HashMap<StoreOp, FailureRule>>,
}

impl MemoryEntryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `op` fail with `message`.
    pub fn fail(&self, op: StoreOp, message: impl Into<String>) {
        self.fail_after(op, 0, message);
    }

    /// Let `successes` calls of `op` through, then fail every later call.
    pub fn fail_after(&self, op: StoreOp, successes: usize, message: impl Into<String>) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(
                op,
                FailureRule {
                    remaining_ok: successes,
                    message: message.into(),
                },
            );
        }
    }

    /// Remove all scripted failures.
    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.clear();
        }
    }

    /// Number of entries stored for `user`.
    pub async fn len(&self, user: &UserId) -> usize {
        self.collections
            .read()
            .await
            .get(user)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Whether `user` has no entries.
    pub async fn is_empty(&self, user: &UserId) -> bool {
        self.len(user).await == 0
    }

    fn check(&self, op: StoreOp) -> Result<()> {
        let mut failures = self
            .failures
            .lock()
            .map_err(|_| Error::Internal("failure script lock poisoned".to_string()))?;
        if let Some(rule) = failures.get_mut(&op) {
            if rule.remaining_ok == 0 {
                return Err(Error::Internal(rule.message.clone()));
            }
            rule.remaining_ok -= 1;
        }
        Ok(())
    }
}

fn select<'a>(entries: &'a [Entry], filter: &EntryFilter) -> Result<Vec<&'a Entry>> {
    let mut selected = Vec::new();
    for entry in entries {
        if filter.matches(entry)? {
            selected.push(entry);
        }
    }
    Ok(selected)
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn find_one(&self, user: &UserId, filter: &EntryFilter) -> Result<Entry> {
        self.check(StoreOp::Find)?;
        let collections = self.collections.read().await;
        let entries = collections.get(user).map(Vec::as_slice).unwrap_or(&[]);
        select(entries, filter)?
            .into_iter()
            .next()
            .cloned()
            .ok_or_else(|| Error::NotFound("entry".to_string()))
    }

    async fn find(&self, user: &UserId, filter: &EntryFilter) -> Result<Vec<Entry>> {
        self.check(StoreOp::Find)?;
        let collections = self.collections.read().await;
        let entries = collections.get(user).map(Vec::as_slice).unwrap_or(&[]);
        Ok(select(entries, filter)?.into_iter().cloned().collect())
    }

    async fn insert(&self, user: &UserId, entry: &Entry) -> Result<()> {
        self.check(StoreOp::Insert)?;
        let mut collections = self.collections.write().await;
        let entries = collections.entry(user.clone()).or_default();
        if entries
            .iter()
            .any(|e| e.content == entry.content || e.uuid == entry.uuid)
        {
            return Err(Error::Duplicate(format!(
                "entry with content or uuid {} already stored",
                entry.uuid
            )));
        }
        entries.push(entry.clone());
        trace!(
            subsystem = "db",
            component = "memory_store",
            op = "insert",
            user_id = %user,
            entry_uuid = %entry.uuid,
            "Entry inserted"
        );
        Ok(())
    }

    async fn upsert(&self, user: &UserId, uuid: Uuid, entry: &Entry) -> Result<()> {
        self.check(StoreOp::Upsert)?;
        let mut collections = self.collections.write().await;
        let entries = collections.entry(user.clone()).or_default();
        if entries
            .iter()
            .any(|e| e.uuid != uuid && e.content == entry.content)
        {
            return Err(Error::Duplicate(format!("entry {} collides on content", uuid)));
        }
        match entries.iter_mut().find(|e| e.uuid == uuid) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        trace!(
            subsystem = "db",
            component = "memory_store",
            op = "upsert",
            user_id = %user,
            entry_uuid = %uuid,
            "Entry replaced"
        );
        Ok(())
    }

    async fn remove_one(&self, user: &UserId, filter: &EntryFilter) -> Result<()> {
        self.check(StoreOp::Remove)?;
        let mut collections = self.collections.write().await;
        let entries = collections
            .get_mut(user)
            .ok_or_else(|| Error::NotFound("entry".to_string()))?;
        let mut position = None;
        for (idx, entry) in entries.iter().enumerate() {
            if filter.matches(entry)? {
                position = Some(idx);
                break;
            }
        }
        match position {
            Some(idx) => {
                entries.remove(idx);
                Ok(())
            }
            None => Err(Error::NotFound("entry".to_string())),
        }
    }

    async fn remove_all(&self, user: &UserId, filter: &EntryFilter) -> Result<u64> {
        self.check(StoreOp::Remove)?;
        let mut collections = self.collections.write().await;
        let Some(entries) = collections.get_mut(user) else {
            return Ok(0);
        };
        let mut doomed = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            doomed.push(filter.matches(entry)?);
        }
        let mut verdicts = doomed.into_iter();
        let before = entries.len();
        entries.retain(|_| !verdicts.next().unwrap_or(false));
        Ok((before - entries.len()) as u64)
    }

    async fn count(&self, user: &UserId, filter: &EntryFilter) -> Result<u64> {
        self.check(StoreOp::Count)?;
        let collections = self.collections.read().await;
        let entries = collections.get(user).map(Vec::as_slice).unwrap_or(&[]);
        Ok(select(entries, filter)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryType;
    use chrono::Utc;

    fn user(name: &str) -> UserId {
        UserId::parse(name).unwrap()
    }

    fn entry(kind: EntryType, content: &str) -> Entry {
        let now = Utc::now();
        Entry {
            uuid: Uuid::new_v4(),
            kind,
            content: content.to_string(),
            tags: vec![],
            scheduled: None,
            deadline: None,
            added_at: now,
            modified_at: now,
            priority: None,
            todo_status: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_rejects_content_of_another_entry() {
        let store = MemoryEntryStore::new();
        let alice = user("alice");
        let first = entry(EntryType::Pim, "first");
        let second = entry(EntryType::Pim, "second");
        store.insert(&alice, &first).await.unwrap();
        store.insert(&alice, &second).await.unwrap();

        let mut clash = second.clone();
        clash.content = "first".to_string();
        let err = store.upsert(&alice, second.uuid, &clash).await.unwrap_err();
        assert!(err.is_duplicate());
        let stored = store
            .find_one(&alice, &EntryFilter::by_uuid(second.uuid))
            .await
            .unwrap();
        assert_eq!(stored.content, "second");

        // Rewriting an entry with its own content is not a clash.
        let mut retagged = first.clone();
        retagged.tags = vec!["kept".to_string()];
        store.upsert(&alice, first.uuid, &retagged).await.unwrap();
        store
            .upsert(&user("bob"), second.uuid, &clash)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_collections_are_isolated_per_user() {
        let store = MemoryEntryStore::new();
        let alice = user("alice");
        let bob = user("bob");

        store
            .insert(&alice, &entry(EntryType::Pim, "alice's note"))
            .await
            .unwrap();

        assert_eq!(store.count(&alice, &EntryFilter::All).await.unwrap(), 1);
        assert_eq!(store.count(&bob, &EntryFilter::All).await.unwrap(), 0);
        assert!(store
            .find_one(&bob, &EntryFilter::by_content("alice's note"))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_content() {
        let store = MemoryEntryStore::new();
        let alice = user("alice");
        store
            .insert(&alice, &entry(EntryType::Pim, "same"))
            .await
            .unwrap();
        let err = store
            .insert(&alice, &entry(EntryType::Org, "same"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_upsert_recreates_missing_entry() {
        let store = MemoryEntryStore::new();
        let alice = user("alice");
        let e = entry(EntryType::Bookmark, "https://example.com");

        store.upsert(&alice, e.uuid, &e).await.unwrap();
        assert_eq!(store.len(&alice).await, 1);

        let mut changed = e.clone();
        changed.content = "https://example.org".to_string();
        store.upsert(&alice, e.uuid, &changed).await.unwrap();

        let found = store
            .find_one(&alice, &EntryFilter::by_uuid(e.uuid))
            .await
            .unwrap();
        assert_eq!(found.content, "https://example.org");
        assert_eq!(store.len(&alice).await, 1);
    }

    #[tokio::test]
    async fn test_remove_one_reports_not_found() {
        let store = MemoryEntryStore::new();
        let alice = user("alice");
        let e = entry(EntryType::Pim, "x");
        store.insert(&alice, &e).await.unwrap();

        store
            .remove_one(&alice, &EntryFilter::by_uuid(e.uuid))
            .await
            .unwrap();
        let err = store
            .remove_one(&alice, &EntryFilter::by_uuid(e.uuid))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty(&alice).await);
    }

    #[tokio::test]
    async fn test_remove_all_counts_matches() {
        let store = MemoryEntryStore::new();
        let alice = user("alice");
        store.insert(&alice, &entry(EntryType::Pim, "a")).await.unwrap();
        store.insert(&alice, &entry(EntryType::Org, "b")).await.unwrap();
        store.insert(&alice, &entry(EntryType::Org, "c")).await.unwrap();

        let removed = store
            .remove_all(&alice, &EntryFilter::TypeIn(vec!["org".to_string()]))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len(&alice).await, 1);
    }

    #[tokio::test]
    async fn test_scripted_failure_after_successes() {
        let store = MemoryEntryStore::new();
        let alice = user("alice");
        store.fail_after(StoreOp::Count, 1, "boom");

        assert!(store.count(&alice, &EntryFilter::All).await.is_ok());
        let err = store.count(&alice, &EntryFilter::All).await.unwrap_err();
        assert_eq!(err.to_string(), "Internal error: boom");

        store.clear_failures();
        assert!(store.count(&alice, &EntryFilter::All).await.is_ok());
    }
}
