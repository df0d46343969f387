//! Core of the HTTP cache.
//!
//! This crate provides:
//! - Immutable HTTP value objects (headers, conditionals, requests, responses)
//! - Cache-control, freshness and cacheability rules
//! - The `CacheStorage` trait with in-memory and SQLite backends
//! - The cache decision engine and the `NetworkExchanger` seam it calls
//! - Unified error types and configuration structures

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;

pub use cache::{CacheItem, CacheKey, CacheStorage, MemoryStorage, SqliteStorage};
pub use config::{AppConfig, ConfigError, StorageBackend};
pub use engine::{HttpCache, NetworkExchanger, Outcome, Resolved, StatisticsSnapshot};
pub use error::Error;
pub use http::{Conditionals, Headers, HttpRequest, HttpResponse, Method, Payload, Status};
