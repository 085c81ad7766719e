use miette::Diagnostic;
use thiserror::Error;

use crate::db::DbError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] DbError),

    #[error("{entity_type} not found: {id}")]
    #[diagnostic(code(feedstore::cli::not_found))]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {message}")]
    #[diagnostic(code(feedstore::cli::invalid_input))]
    InvalidInput { message: String },

    #[error("Failed to create data directory: {0}")]
    #[diagnostic(code(feedstore::cli::io))]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {message}")]
    #[diagnostic(code(feedstore::cli::output))]
    Output { message: String },
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output {
            message: e.to_string(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
