//! Entry store implementation.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use mentat_core::{Entry, EntryFilter, EntryStore, EntryType, Error, PostMetadata, Result, UserId};

use crate::filter_sql::{EntryFilterQueryBuilder, QueryParam};

const ENTRY_COLUMNS: &str = "uuid, type, content, tags, scheduled, deadline, added_at, \
                             modified_at, priority, todo_status, metadata";

/// PostgreSQL implementation of [`EntryStore`].
///
/// All users share the `entry` table; every statement is scoped by
/// `user_id = $1`.
#[derive(Clone)]
pub struct PgEntryStore {
    pool: Pool<Postgres>,
}

impl PgEntryStore {
    /// Create a new PgEntryStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// WHERE clause for `filter` scoped to one user, with its parameters.
    fn scoped(filter: &EntryFilter) -> (String, Vec<QueryParam>) {
        let (clause, params) = EntryFilterQueryBuilder::new(filter, 1).build();
        (format!("user_id = $1 AND {}", clause), params)
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: Vec<QueryParam>,
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            QueryParam::Uuid(v) => query.bind(v),
            QueryParam::UuidArray(v) => query.bind(v),
            QueryParam::String(v) => query.bind(v),
            QueryParam::StringArray(v) => query.bind(v),
        };
    }
    query
}

fn row_to_entry(row: &PgRow) -> Result<Entry> {
    let raw_type: String = row.try_get("type").map_err(Error::Database)?;
    let kind = raw_type.parse::<EntryType>().map_err(|e| {
        Error::Internal(format!("stored entry has invalid type '{}': {}", raw_type, e))
    })?;
    let metadata: Option<Json<PostMetadata>> = row.try_get("metadata").map_err(Error::Database)?;

    Ok(Entry {
        uuid: row.try_get("uuid").map_err(Error::Database)?,
        kind,
        content: row.try_get("content").map_err(Error::Database)?,
        tags: row.try_get("tags").map_err(Error::Database)?,
        scheduled: row.try_get("scheduled").map_err(Error::Database)?,
        deadline: row.try_get("deadline").map_err(Error::Database)?,
        added_at: row.try_get("added_at").map_err(Error::Database)?,
        modified_at: row.try_get("modified_at").map_err(Error::Database)?,
        priority: row.try_get("priority").map_err(Error::Database)?,
        todo_status: row.try_get("todo_status").map_err(Error::Database)?,
        metadata: metadata.map(|Json(m)| m),
    })
}

/// Bind the eleven entry columns in [`ENTRY_COLUMNS`] order, after `user_id`.
fn bind_entry<'q>(
    query: Query<'q, Postgres, PgArguments>,
    user: &UserId,
    entry: &Entry,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(user.as_str().to_string())
        .bind(entry.uuid)
        .bind(entry.kind.as_str())
        .bind(entry.content.clone())
        .bind(entry.tags.clone())
        .bind(entry.scheduled)
        .bind(entry.deadline)
        .bind(entry.added_at)
        .bind(entry.modified_at)
        .bind(entry.priority.clone())
        .bind(entry.todo_status.clone())
        .bind(entry.metadata.clone().map(Json))
}

/// Map a unique violation to [`Error::Duplicate`]; pass anything else through.
fn map_insert_error(err: sqlx::Error, uuid: Uuid) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Error::Duplicate(format!(
            "entry {} collides on {}",
            uuid,
            db_err.constraint().unwrap_or("a unique key")
        )),
        _ => Error::Database(err),
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn find_one(&self, user: &UserId, filter: &EntryFilter) -> Result<Entry> {
        let (clause, params) = Self::scoped(filter);
        let sql = format!(
            "SELECT {} FROM entry WHERE {} LIMIT 1",
            ENTRY_COLUMNS, clause
        );
        let query = bind_params(sqlx::query(&sql).bind(user.as_str()), params);

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("entry".to_string()))?;
        row_to_entry(&row)
    }

    async fn find(&self, user: &UserId, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let start = Instant::now();
        let (clause, params) = Self::scoped(filter);
        let sql = format!(
            "SELECT {} FROM entry WHERE {} ORDER BY added_at, uuid",
            ENTRY_COLUMNS, clause
        );
        let query = bind_params(sqlx::query(&sql).bind(user.as_str()), params);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        let entries = rows.iter().map(row_to_entry).collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "db",
            component = "entry_store",
            op = "find",
            user_id = %user,
            result_count = entries.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Entries fetched"
        );
        Ok(entries)
    }

    async fn insert(&self, user: &UserId, entry: &Entry) -> Result<()> {
        let sql = format!(
            "INSERT INTO entry (user_id, {}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            ENTRY_COLUMNS
        );
        bind_entry(sqlx::query(&sql), user, entry)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, entry.uuid))?;
        Ok(())
    }

    async fn upsert(&self, user: &UserId, uuid: Uuid, entry: &Entry) -> Result<()> {
        let mut stored = entry.clone();
        stored.uuid = uuid;

        let sql = format!(
            "INSERT INTO entry (user_id, {}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (user_id, uuid) DO UPDATE SET \
                 type = EXCLUDED.type, \
                 content = EXCLUDED.content, \
                 tags = EXCLUDED.tags, \
                 scheduled = EXCLUDED.scheduled, \
                 deadline = EXCLUDED.deadline, \
                 added_at = EXCLUDED.added_at, \
                 modified_at = EXCLUDED.modified_at, \
                 priority = EXCLUDED.priority, \
                 todo_status = EXCLUDED.todo_status, \
                 metadata = EXCLUDED.metadata",
            ENTRY_COLUMNS
        );
        bind_entry(sqlx::query(&sql), user, &stored)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, uuid))?;
        Ok(())
    }

    async fn remove_one(&self, user: &UserId, filter: &EntryFilter) -> Result<()> {
        let (clause, params) = Self::scoped(filter);
        let sql = format!(
            "DELETE FROM entry WHERE ctid IN (SELECT ctid FROM entry WHERE {} LIMIT 1)",
            clause
        );
        let result = bind_params(sqlx::query(&sql).bind(user.as_str()), params)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("entry".to_string()));
        }
        Ok(())
    }

    async fn remove_all(&self, user: &UserId, filter: &EntryFilter) -> Result<u64> {
        let (clause, params) = Self::scoped(filter);
        let sql = format!("DELETE FROM entry WHERE {}", clause);
        let result = bind_params(sqlx::query(&sql).bind(user.as_str()), params)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "entry_store",
            op = "remove_all",
            user_id = %user,
            deleted_count = result.rows_affected(),
            "Entries removed"
        );
        Ok(result.rows_affected())
    }

    async fn count(&self, user: &UserId, filter: &EntryFilter) -> Result<u64> {
        let (clause, params) = Self::scoped(filter);
        let sql = format!("SELECT COUNT(*) FROM entry WHERE {}", clause);
        let count: i64 = bind_params(sqlx::query(&sql).bind(user.as_str()), params)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?
            .try_get(0)
            .map_err(Error::Database)?;
        Ok(count.max(0) as u64)
    }
}
