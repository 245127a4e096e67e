//! pjax-mcp server entry point.
//!
//! Boots a browsing session against the configured site, registers the
//! worker, opens the start page, then serves MCP on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use pjax_core::AppConfig;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod session;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!("Starting pjax-mcp for {} on stdio transport", config.origin);

    let session = Arc::new(session::Session::start(config).await?);

    // The page still loads from the network when the worker cannot install.
    if let Err(e) = session.install().await {
        tracing::warn!("worker registration failed: {}", e);
    }
    match session.start_url() {
        Ok(url) => {
            if let Err(e) = session.navigator().open(url).await {
                tracing::warn!("could not open start page: {}", e);
            }
        }
        Err(e) => tracing::warn!("invalid start path: {}", e),
    }

    let handler = handler::PjaxServer::new(session);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
