//! Backend selection.
//!
//! Configuration is consumed once, when the storage is opened. A missing
//! connection parameter is reported immediately as
//! [`DbError::Configuration`].

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::db::{DbError, DbResult};

/// Which engine backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// sqlx over a connection URI.
    Relational,
    /// rusqlite over a database file.
    #[default]
    Embedded,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Relational => write!(f, "relational"),
            BackendKind::Embedded => write!(f, "embedded"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relational" | "sqlx" => Ok(BackendKind::Relational),
            "embedded" | "sqlite" => Ok(BackendKind::Embedded),
            other => Err(DbError::Configuration {
                message: format!("unknown storage backend '{}'", other),
            }),
        }
    }
}

/// Fully resolved storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Relational { uri: String },
    Embedded { path: PathBuf },
}

impl StorageConfig {
    /// Build a configuration from loose options, failing fast when the
    /// option the chosen backend needs is absent.
    pub fn from_options(
        backend: BackendKind,
        uri: Option<String>,
        path: Option<PathBuf>,
    ) -> DbResult<Self> {
        match backend {
            BackendKind::Relational => match uri.filter(|u| !u.trim().is_empty()) {
                Some(uri) => Ok(StorageConfig::Relational { uri }),
                None => Err(DbError::Configuration {
                    message: "relational backend needs a uri option".to_string(),
                }),
            },
            BackendKind::Embedded => match path.filter(|p| !p.as_os_str().is_empty()) {
                Some(path) => Ok(StorageConfig::Embedded { path }),
                None => Err(DbError::Configuration {
                    message: "embedded backend needs a path option".to_string(),
                }),
            },
        }
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            StorageConfig::Relational { .. } => BackendKind::Relational,
            StorageConfig::Embedded { .. } => BackendKind::Embedded,
        }
    }
}

/// Default location of the embedded database file.
///
/// `$XDG_DATA_HOME/feedstore/feedstore.db`, falling back to
/// `$HOME/.local/share`. Returns `None` when neither variable is set.
pub fn default_db_path() -> Option<PathBuf> {
    let data_home = env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share")))?;
    Some(data_home.join("feedstore").join("feedstore.db"))
}
