#![deny(warnings)]
#![deny(clippy::unwrap_used)]

use dotenv::dotenv;
use jumprun::mcp::McpRemoteCommands;
use poem_mcpserver::McpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // stdout carries the protocol, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    poem_mcpserver::stdio::stdio(McpServer::new().tools(McpRemoteCommands)).await?;
    Ok(())
}
