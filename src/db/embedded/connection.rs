//! rusqlite connection lifecycle and schema bootstrap.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::db::schema::{STORIES_FEED_INDEX, TABLES};
use crate::db::{DbError, DbResult};

/// Storage backed by a single embedded database file.
pub struct EmbeddedStorage {
    conn: Mutex<Connection>,
}

impl EmbeddedStorage {
    /// Open the database at `path`, creating missing tables.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(DbError::Configuration {
                message: "embedded backend needs a path option".to_string(),
            });
        }

        let conn = Connection::open(path).map_err(|e| DbError::Connection {
            message: e.to_string(),
        })?;
        let storage = Self::bootstrap(conn)?;
        info!(backend = "embedded", path = %path.display(), "storage opened");
        Ok(storage)
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Connection {
            message: e.to_string(),
        })?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> DbResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?;

        for &(name, create) in TABLES {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [name],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| DbError::Migration {
                    message: e.to_string(),
                })?;

            if existing.is_none() {
                conn.execute_batch(create).map_err(|e| DbError::Migration {
                    message: format!("failed to create table {}: {}", name, e),
                })?;
                debug!(table = name, "table created");
            }
        }

        conn.execute_batch(STORIES_FEED_INDEX)
            .map_err(|e| DbError::Migration {
                message: e.to_string(),
            })?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a function with access to the underlying connection.
    ///
    /// This is useful for testing and advanced operations that need
    /// direct database access.
    pub fn with_connection<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.lock()?;
        f(&conn).map_err(|e| DbError::Database {
            message: e.to_string(),
        })
    }

    /// Run `f` with the connection while mapping errors itself.
    pub(crate) fn with_conn_mut<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut Connection) -> DbResult<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }

    fn lock(&self) -> DbResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| DbError::Database {
            message: format!("Failed to acquire database lock: {}", e),
        })
    }
}
