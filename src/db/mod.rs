//! Storage abstraction for the feed reader.
//!
//! This module provides a trait-based storage contract so that the
//! relational store and the embedded store can be swapped without changing
//! application logic.
//!
//! # Architecture
//!
//! - `error`: Storage-agnostic error types
//! - `models`: Domain entities (User, Feed, Story, Setting)
//! - `repository`: The [`Storage`] contract
//! - `config`: Backend selection
//! - `relational`: sqlx implementation
//! - `embedded`: rusqlite implementation
//! - `backend`: [`AnyStorage`], the configuration-selected implementation

mod backend;
mod config;
mod embedded;
mod error;
mod models;
mod relational;
mod repository;
mod schema;
pub(crate) mod utils;

#[cfg(test)]
mod backend_test;
#[cfg(test)]
mod contract_test;

pub use backend::AnyStorage;
pub use config::{BackendKind, StorageConfig, default_db_path};
pub use embedded::EmbeddedStorage;
pub use error::{DbError, DbResult};
pub use models::*;
pub use relational::RelationalStorage;
pub use repository::Storage;
