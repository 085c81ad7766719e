//! Persistence layer for a feed reader.
//!
//! [`db`] holds the storage contract and its two backends. [`cli`] is a
//! small administration tool built on top of that contract.

#[cfg(feature = "cli")]
pub mod cli;
pub mod db;
