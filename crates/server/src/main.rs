//! postmirror server entry point.
//!
//! Wires the store, remote client, sync engine and network tap together, then
//! boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use postmirror_client::{GraphqlClient, GraphqlConfig, NetworkTap};
use postmirror_core::{AppConfig, CacheStore, RelayRouter, SyncEngine, SyncSettings};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod bridge;
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

    let config = AppConfig::load()?;
    tracing::info!(db = %config.db_path.display(), "Starting postmirror server on stdio transport");

    let store = CacheStore::open(&config.db_path).await?;
    let remote = Arc::new(GraphqlClient::new(GraphqlConfig::from(&config))?);
    let (engine, _writer) = SyncEngine::spawn(store.clone(), remote, SyncSettings::from(&config));

    let tap = Arc::new(NetworkTap::from_config(&config)?);
    tokio::spawn(bridge::forward_mutations(tap.subscribe(), engine.clone()));

    let initial = engine.clone();
    tokio::spawn(async move {
        match initial.sync().await {
            Ok(outcome) => tracing::info!(?outcome, "initial sync finished"),
            Err(err) => tracing::warn!(error = %err, "initial sync failed"),
        }
    });

    let relay = RelayRouter::new(engine, config.trusted_origins.clone());
    let handler = handler::PostMirrorServer::new(store, relay, tap, &config);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
