// MCP Connectors Main Entry Point
// Serves every enabled connector over stdio JSON-RPC, HTTP, or both
use anyhow::Result;
use mcp_connectors::{api, config::LogFormat, ConnectorManager, McpConfig, McpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the stdio transport, so logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = McpConfig::from_env()?;
    init_tracing(config.log_format);

    info!(transport = ?config.transport, "Starting MCP connectors service");

    let manager = Arc::new(ConnectorManager::new(&config)?);
    let server = McpServer::new(manager);

    let stdio = {
        let server = server.clone();
        let enabled = config.transport.serves_stdio();
        async move {
            if !enabled {
                return;
            }
            if let Err(e) = server.run().await {
                error!("MCP stdio transport failed: {}", e);
            }
        }
    };

    let http = {
        let enabled = config.transport.serves_http();
        let host = config.host.clone();
        let port = config.port;
        async move {
            if !enabled {
                return Ok(());
            }
            api::serve(server, &host, port).await
        }
    };

    // The HTTP transport keeps the process alive after stdin closes.
    let ((), http_result) = tokio::join!(stdio, http);
    if let Err(e) = http_result {
        error!("HTTP transport failed: {}", e);
        return Err(e.into());
    }

    warn!("All transports stopped");
    Ok(())
}
