//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable (a `.env` file is loaded
//! first by the binary). The listen port and the database location have no
//! default: startup fails without them.

use clap::Parser;

use mentat_core::{Error, Result};
use mentat_db::pool::DEFAULT_MAX_CONNECTIONS;

/// Database name used when `--dbhost` names a bare host.
pub const DEFAULT_DATABASE_NAME: &str = "mentat";

#[derive(Debug, Clone, Parser)]
#[command(name = "mentat-api")]
#[command(author, version, about = "JSON-RPC entry service for mentat")]
pub struct Cli {
    /// Address to listen on
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// PostgreSQL URL, or a bare `host[:port]` for the default database
    #[arg(short, long, env = "DATABASE_URL")]
    pub dbhost: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

/// Validated service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
}

impl ServiceConfig {
    /// `host:port` string to bind.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Cli {
    /// Check required settings and resolve the database URL.
    pub fn into_config(self) -> Result<ServiceConfig> {
        let port = self
            .port
            .ok_or_else(|| Error::Config("port is required (--port or PORT)".to_string()))?;

        let dbhost = self
            .dbhost
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("database is required (--dbhost or DATABASE_URL)".to_string())
            })?;

        if self.max_connections == 0 {
            return Err(Error::Config(
                "max connections must be at least 1".to_string(),
            ));
        }

        Ok(ServiceConfig {
            host: self.host,
            port,
            database_url: database_url(&dbhost),
            max_connections: self.max_connections,
        })
    }
}

/// Full URLs pass through; a bare host gets the default database.
fn database_url(dbhost: &str) -> String {
    if dbhost.contains("://") {
        dbhost.to_string()
    } else {
        format!("postgres://{}/{}", dbhost, DEFAULT_DATABASE_NAME)
    }
}
