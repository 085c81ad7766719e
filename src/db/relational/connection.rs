//! sqlx pool lifecycle and schema migration.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::db::{DbError, DbResult};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations/relational");

/// Storage backed by a relational engine reached through a connection URI.
///
/// The pool holds exactly one connection for the lifetime of the store.
/// That connection is the store's single session: it is never reaped, so
/// `sqlite::memory:` databases survive between calls.
pub struct RelationalStorage {
    pub(crate) pool: SqlitePool,
}

impl RelationalStorage {
    /// Connect to `uri` and create the schema if needed.
    pub async fn open(uri: &str) -> DbResult<Self> {
        if uri.trim().is_empty() {
            return Err(DbError::Configuration {
                message: "relational backend needs a uri option".to_string(),
            });
        }

        let options = SqliteConnectOptions::from_str(uri)
            .map_err(|e| DbError::Configuration {
                message: format!("invalid uri '{}': {}", uri, e),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?;

        let storage = Self { pool };
        storage.migrate().await?;
        info!(backend = "relational", uri, "storage opened");
        Ok(storage)
    }

    /// Open a private in-memory database (useful for testing).
    pub async fn in_memory() -> DbResult<Self> {
        Self::open("sqlite::memory:").await
    }

    /// Apply pending migrations. Running it again is a no-op.
    pub async fn migrate(&self) -> DbResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| DbError::Migration {
                message: e.to_string(),
            })
    }

    /// Access the underlying pool.
    ///
    /// Useful for tests and diagnostics that need raw queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
