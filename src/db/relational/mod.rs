//! Relational store: the storage contract over sqlx.
//!
//! Rows are mapped onto typed records through `FromRow` row structs and
//! the schema is created by the embedded sqlx migrator when the store is
//! opened.

mod connection;
mod rows;
mod storage;


pub use connection::RelationalStorage;
