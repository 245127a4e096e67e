//! SQLite-backed cache storage for worker responses.
//!
//! This module provides named cache stores persisted in SQLite with async
//! access via tokio-rusqlite. It supports:
//!
//! - Request-keyed entries using SHA-256 hashing of method and URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-store publishing in a single transaction

pub mod connection;
pub mod generation;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use generation::CacheGeneration;
pub use storage::CacheEntry;
