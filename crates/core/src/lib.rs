//! Core types and shared functionality for pjax.
//!
//! This crate provides:
//! - Named cache stores with a SQLite backend
//! - Route normalization and request classification
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod route;

pub use cache::{CacheDb, CacheEntry, CacheGeneration};
pub use classify::{Classifier, RequestClass, Strategy};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use route::RouteKey;
