//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the worker's cache stores.

pub mod lookup;

pub use lookup::{CacheLookupParams, lookup_impl};
