//! mcp-httpcache server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use httpcache_client::{ExchangeConfig, ReqwestExchanger};
use httpcache_core::{AppConfig, CacheStorage, HttpCache, MemoryStorage, SqliteStorage, StorageBackend};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let storage = open_storage(&config).await?;
    let exchanger = ReqwestExchanger::new(ExchangeConfig::from(&config))?;

    tracing::info!(
        storage = ?config.storage,
        max_entries = ?config.max_entries,
        "Starting mcp-httpcache server on stdio transport"
    );

    let handler = handler::HttpCacheServer::new(HttpCache::new(storage, Arc::new(exchanger)));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

async fn open_storage(config: &AppConfig) -> Result<Arc<dyn CacheStorage>> {
    let storage: Arc<dyn CacheStorage> = match config.storage {
        StorageBackend::Sqlite => {
            let db = SqliteStorage::open(&config.db_path)
                .await
                .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
            Arc::new(db.with_max_entries(config.max_entries))
        }
        StorageBackend::Memory => Arc::new(match config.max_entries {
            Some(capacity) => MemoryStorage::with_capacity(capacity),
            None => MemoryStorage::unbounded(),
        }),
    };
    Ok(storage)
}
