//! Embedded store: the storage contract over a direct rusqlite connection.
//!
//! No mapping layer: rows are translated by hand, the schema is
//! bootstrapped table by table, and relationships are maintained with
//! explicit queries.

mod connection;
mod storage;


pub use connection::EmbeddedStorage;
