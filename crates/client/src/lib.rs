//! Network side of the HTTP cache.
//!
//! This crate provides the `reqwest`-backed `NetworkExchanger` the cache
//! engine uses to reach origin servers.

pub mod fetch;

pub use fetch::{ExchangeConfig, ReqwestExchanger};
