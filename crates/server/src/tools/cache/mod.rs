//! Cache administration MCP tools.
//!
//! This module provides tools for inspecting and pruning cache storage.

pub mod clear;
pub mod invalidate;
pub mod stats;

pub use clear::{CacheClearParams, clear_impl};
pub use invalidate::{CacheInvalidateParams, invalidate_impl};
pub use stats::stats_impl;
