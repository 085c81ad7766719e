//! Storage error types.
//!
//! These errors are backend agnostic: both the relational and the embedded
//! store translate their engine failures into [`DbError`]. Routine
//! not-found outcomes are never errors; they are `Option`s or empty
//! collections in the [`Storage`](crate::db::Storage) signatures.

use miette::Diagnostic;
use thiserror::Error;

/// Storage operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(feedstore::db::configuration),
        help("Pass --uri for the relational backend or --path for the embedded backend")
    )]
    Configuration { message: String },

    #[error("Entity already exists: {entity_type} '{id}'")]
    #[diagnostic(code(feedstore::db::already_exists))]
    AlreadyExists { entity_type: String, id: String },

    #[error("Invalid data: {message}")]
    #[diagnostic(code(feedstore::db::invalid_data))]
    InvalidData {
        message: String,
        #[help]
        help: String,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(feedstore::db::validation_error))]
    Validation { message: String },

    #[error("Constraint violation: {message}")]
    #[diagnostic(code(feedstore::db::constraint))]
    Constraint { message: String },

    #[error("Database error: {message}")]
    #[diagnostic(code(feedstore::db::database_error))]
    Database { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(code(feedstore::db::migration_error))]
    Migration { message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(feedstore::db::connection_error))]
    Connection { message: String },
}

impl DbError {
    pub(crate) fn missing_feed(feed_id: &str) -> Self {
        DbError::Constraint {
            message: format!("feed '{}' does not exist", feed_id),
        }
    }
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;
