//! # mentat-db
//!
//! PostgreSQL storage backend for the mentat entry service.
//!
//! This crate provides:
//! - Connection pool management
//! - [`PgEntryStore`], the [`EntryStore`](mentat_core::EntryStore)
//!   implementation over the `entry` table
//! - Compilation of [`EntryFilter`](mentat_core::EntryFilter) into
//!   parameterized SQL
//! - Schema migrations
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mentat_core::EntryGateway;
//! use mentat_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/mentat").await?;
//!     db.migrate().await?;
//!
//!     let gateway = EntryGateway::new(Arc::new(db.entries.clone()));
//!     Ok(())
//! }
//! ```
pub mod entries;
pub mod filter_sql;
pub mod pool;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

pub use mentat_core::{Error, Result};

pub use entries::PgEntryStore;
pub use filter_sql::{EntryFilterQueryBuilder, QueryParam};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

/// Database context: the connection pool and the repositories built on it.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Entry collections of every user.
    pub entries: PgEntryStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            entries: PgEntryStore::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Close every pooled connection, waiting for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
