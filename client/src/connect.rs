//! Per-server session establishment
//!
//! Opens a transport, performs the initialize handshake under a timeout, and
//! loads the server's tool catalog. One call here is one server's attempt;
//! the client runs these concurrently and captures failures per server.

use std::time::Duration;

use anyhow::{Context, Result};
use rmcp::{
    service::RunningService,
    transport::{StreamableHttpClientTransport, TokioChildProcess},
    RoleClient, ServiceExt,
};
use tokio::process::Command;

use crate::config::ConnectionConfig;
use crate::error::ConnectError;
use crate::types::McpTool;

/// An established session plus its loaded tool catalog
pub(crate) struct ConnectedServer {
    pub service: RunningService<RoleClient, ()>,
    pub tools: Vec<McpTool>,
}

/// Connect to one server, initialize within `timeout`, and load its tools
///
/// The timeout bounds transport open plus the initialize handshake. A tool
/// listing failure abandons the fresh session and is captured the same way
/// as any other initialization failure.
pub(crate) async fn connect_server(
    name: &str,
    config: &ConnectionConfig,
    timeout: Duration,
) -> Result<ConnectedServer, ConnectError> {
    tracing::debug!("Connecting to MCP server: {}", name);

    let service = tokio::time::timeout(timeout, open_session(config))
        .await
        .map_err(|_| ConnectError::InitTimeout { timeout })?
        .map_err(ConnectError::failure)?;

    let response = match service.list_tools(Default::default()).await {
        Ok(response) => response,
        Err(e) => {
            // Abandon the session; a half-set-up server is treated as failed
            let _ = service.cancel().await;
            return Err(ConnectError::failure(
                anyhow::Error::new(e).context("Failed to list tools"),
            ));
        }
    };

    let tools = response
        .tools
        .into_iter()
        .map(|t| McpTool {
            server: name.to_string(),
            name: t.name.to_string(),
            description: t.description.map(|d| d.to_string()),
            input_schema: Some(serde_json::to_value(&t.input_schema).unwrap_or_default()),
        })
        .collect();

    Ok(ConnectedServer { service, tools })
}

/// One-shot health probe: connect, initialize, tear straight back down
pub(crate) async fn probe(
    name: &str,
    config: &ConnectionConfig,
    timeout: Duration,
) -> Result<(), ConnectError> {
    tracing::debug!("Pinging MCP server: {}", name);

    let service = tokio::time::timeout(timeout, open_session(config))
        .await
        .map_err(|_| ConnectError::InitTimeout { timeout })?
        .map_err(ConnectError::failure)?;

    if let Err(e) = service.cancel().await {
        tracing::warn!("Error closing probe session for '{}': {}", name, e);
    }
    Ok(())
}

/// Open the transport and perform the MCP initialize handshake
async fn open_session(config: &ConnectionConfig) -> Result<RunningService<RoleClient, ()>> {
    match config {
        ConnectionConfig::Stdio { command, args, env } => {
            let mut cmd = Command::new(command);
            if !args.is_empty() {
                cmd.args(args);
            }
            for (key, value) in env {
                let expanded = shellexpand::env(value).unwrap_or_else(|_| value.clone().into());
                cmd.env(key, expanded.as_ref());
            }

            let transport = TokioChildProcess::new(cmd)
                .with_context(|| format!("Failed to spawn command '{}'", command))?;
            let service = ().serve(transport).await.context("Initialize failed")?;
            Ok(service)
        }
        ConnectionConfig::Sse { url } => {
            let transport = StreamableHttpClientTransport::from_uri(url.clone());
            let service = ()
                .serve(transport)
                .await
                .with_context(|| format!("Initialize failed for '{}'", url))?;
            Ok(service)
        }
    }
}
