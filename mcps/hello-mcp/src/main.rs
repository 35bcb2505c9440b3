//! Hello MCP Server
//!
//! Minimal stdio MCP server exposing one tool, `test-tool`, which returns the
//! JSON payload `{"data": "Hello World!"}`. Exists as a live fixture for the
//! mcp-multi-client integration tests.
//!
//! Run directly: `hello-mcp`

mod server;

use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use server::HelloMcpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr; stdout is reserved for the MCP protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hello_mcp=info".parse()?))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting hello-mcp server");

    let service = HelloMcpServer::new().serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}
