#![deny(warnings)]
#![deny(clippy::unwrap_used)]

use dotenv::dotenv;
use jumprun::mcp::McpRemoteCommands;
use poem::{EndpointExt, Route, Server, listener::TcpListener, middleware::Tracing};
use poem_mcpserver::{McpServer, streamable_http};
use tracing::info;

/// Default HTTP port of the MCP server
const DEFAULT_MCP_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let mcp_port: u16 = std::env::var("MCP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_MCP_PORT);
    let mcp_addr = format!("0.0.0.0:{}", mcp_port);
    info!("Starting MCP server on {}", mcp_addr);

    let app = Route::new()
        .at(
            "/",
            streamable_http::endpoint(|_| McpServer::new().tools(McpRemoteCommands)),
        )
        .with(Tracing);

    info!("Use remote_execute to run a command through jump hosts");

    Server::new(TcpListener::bind(mcp_addr))
        .name("jumprun MCP Server")
        .run(app)
        .await?;

    Ok(())
}
