//! Multi-server MCP client
//!
//! Owns one session per configured server and routes tool calls to the right
//! one. Connection attempts run concurrently, each bounded by its own
//! initialize timeout; a server that fails to come up is recorded in the
//! error table and never blocks or fails its siblings. The shared lifetime is
//! reentrant: nested `enter`/`exit` pairs refcount a single underlying
//! connect/teardown.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use rmcp::{
    model::{CallToolRequestParam, CallToolResult, RawContent},
    service::RunningService,
    RoleClient,
};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{ConnectionTable, McpConfig};
use crate::connect;
use crate::error::{ClientError, ConnectError};
use crate::types::{McpTool, ToolOutput};

/// Default bound on a single server's initialize handshake
const DEFAULT_INITIALIZE_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a fixed set of named MCP servers
///
/// After a connection pass, every configured server sits in exactly one of
/// the tool catalog (connected, session live) or the error table (attempt
/// failed, error captured). [`call_tool`](Self::call_tool) distinguishes the
/// two: a known-but-errored server raises the captured connection error, a
/// name that was never configured raises [`ClientError::UnknownServer`].
pub struct MultiMcpClient {
    connections: ConnectionTable,
    initialize_timeout: Duration,
    /// Nested scope count; sessions live while this is above zero
    depth: u32,
    sessions: BTreeMap<String, RunningService<RoleClient, ()>>,
    tools: BTreeMap<String, Vec<McpTool>>,
    errors: BTreeMap<String, ConnectError>,
}

impl MultiMcpClient {
    /// Create a client over a connection table
    pub fn new(connections: ConnectionTable) -> Self {
        Self {
            connections,
            initialize_timeout: DEFAULT_INITIALIZE_TIMEOUT,
            depth: 0,
            sessions: BTreeMap::new(),
            tools: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Create a client from a loaded config
    pub fn from_config(config: McpConfig) -> Self {
        Self::new(config.servers)
    }

    /// Set the initialize timeout applied to future connection passes
    ///
    /// Has no effect on sessions that are already established.
    pub fn set_initialize_timeout(&mut self, timeout: Duration) {
        self.initialize_timeout = timeout;
    }

    /// Get list of configured server names
    pub fn server_names(&self) -> Vec<String> {
        self.connections.keys().cloned().collect()
    }

    /// Servers whose sessions are live in the current scope
    pub fn connected_servers(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Servers whose connection attempt failed, with the captured errors
    pub fn errored_servers(&self) -> &BTreeMap<String, ConnectError> {
        &self.errors
    }

    // =========================================================================
    // Shared lifetime (reentrant enter/exit)
    // =========================================================================

    /// Enter the shared scope, connecting to all servers on first entry
    ///
    /// Per-server failures are captured in the error table, never raised
    /// here. Nested entries are cheap; only the 0→1 transition connects.
    pub async fn enter(&mut self) {
        if self.depth == 0 {
            self.connect_all().await;
        }
        self.depth += 1;
    }

    /// Exit the shared scope, tearing down sessions on the outermost exit
    ///
    /// Teardown errors are logged and swallowed; an unmatched exit is a
    /// caller bug and fails with [`ClientError::UnbalancedExit`].
    pub async fn exit(&mut self) -> Result<(), ClientError> {
        if self.depth == 0 {
            return Err(ClientError::UnbalancedExit);
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.close_all().await;
        }
        Ok(())
    }

    /// Connect to every configured server concurrently
    ///
    /// Waits for all attempts; each lands in the tool catalog or the error
    /// table, never both. The awaiting loop owns each server's name, so even
    /// a panicked attempt is recorded against its server.
    async fn connect_all(&mut self) {
        self.sessions.clear();
        self.tools.clear();
        self.errors.clear();

        let mut attempts = Vec::with_capacity(self.connections.len());
        for (name, config) in &self.connections {
            let task_name = name.clone();
            let config = config.clone();
            let timeout = self.initialize_timeout;
            let handle = tokio::spawn(async move {
                connect::connect_server(&task_name, &config, timeout).await
            });
            attempts.push((name.clone(), handle));
        }

        for (name, attempt) in attempts {
            match attempt.await {
                Ok(Ok(connected)) => {
                    tracing::info!("Server '{}': {} tools", name, connected.tools.len());
                    self.sessions.insert(name.clone(), connected.service);
                    self.tools.insert(name, connected.tools);
                }
                Ok(Err(err)) => {
                    tracing::warn!("Server '{}' failed to connect: {}", name, err);
                    self.errors.insert(name, err);
                }
                Err(e) => {
                    tracing::error!("Connection task for '{}' failed: {}", name, e);
                    self.errors.insert(
                        name,
                        ConnectError::InitFailure {
                            message: format!("connection task failed: {}", e),
                        },
                    );
                }
            }
        }
    }

    /// Close every live session and invalidate the tables
    async fn close_all(&mut self) {
        for (name, service) in std::mem::take(&mut self.sessions) {
            tracing::debug!("Closing session for '{}'", name);
            if let Err(e) = service.cancel().await {
                tracing::warn!("Error closing session for '{}': {}", name, e);
            }
        }
        self.tools.clear();
        self.errors.clear();
    }

    // =========================================================================
    // Tool routing
    // =========================================================================

    /// All tools from all connected servers
    ///
    /// Runs under an ambient scope: callable outside `enter`/`exit`, in which
    /// case it connects for the duration of the call.
    pub async fn list_tools(&mut self) -> Result<Vec<McpTool>, ClientError> {
        self.enter().await;
        let tools = self.tools.values().flatten().cloned().collect();
        self.exit().await?;
        Ok(tools)
    }

    /// Call a tool on a specific server
    ///
    /// Runs under an ambient scope, like [`list_tools`](Self::list_tools).
    pub async fn call_tool(
        &mut self,
        server: &str,
        tool: &str,
        arguments: Option<Value>,
    ) -> Result<ToolOutput, ClientError> {
        self.enter().await;
        let result = self.dispatch(server, tool, arguments).await;
        self.exit().await?;
        result
    }

    async fn dispatch(
        &self,
        server: &str,
        tool: &str,
        arguments: Option<Value>,
    ) -> Result<ToolOutput, ClientError> {
        if let Some(err) = self.errors.get(server) {
            return Err(ClientError::ServerConnection {
                server: server.to_string(),
                source: err.clone(),
            });
        }
        let catalog = self
            .tools
            .get(server)
            .ok_or_else(|| ClientError::UnknownServer(server.to_string()))?;
        if !catalog.iter().any(|t| t.name == tool) {
            return Err(ClientError::ToolNotFound {
                server: server.to_string(),
                tool: tool.to_string(),
            });
        }
        let service = self
            .sessions
            .get(server)
            .ok_or_else(|| ClientError::UnknownServer(server.to_string()))?;

        let call_id = Uuid::new_v4();
        tracing::debug!(%call_id, server, tool, "Calling tool");

        let args = arguments.and_then(|v| v.as_object().cloned());
        let result = service
            .call_tool(CallToolRequestParam {
                name: tool.to_string().into(),
                arguments: args,
                task: None,
            })
            .await
            .with_context(|| format!("Failed to call tool '{}' on '{}'", tool, server))?;

        decode_result(server, tool, result)
    }

    // =========================================================================
    // Health probing
    // =========================================================================

    /// Probe every configured server with a one-shot connect
    ///
    /// Probes run concurrently under the initialize timeout and tear their
    /// sessions down immediately. Returns the servers that failed; an empty
    /// map means all are reachable. Live sessions and tables are untouched.
    pub async fn ping_servers(&self) -> BTreeMap<String, ConnectError> {
        let mut probes = Vec::with_capacity(self.connections.len());
        for (name, config) in &self.connections {
            let task_name = name.clone();
            let config = config.clone();
            let timeout = self.initialize_timeout;
            let handle =
                tokio::spawn(async move { connect::probe(&task_name, &config, timeout).await });
            probes.push((name.clone(), handle));
        }

        let mut failures = BTreeMap::new();
        for (name, probe) in probes {
            match probe.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures.insert(name, err);
                }
                Err(e) => {
                    failures.insert(
                        name,
                        ConnectError::InitFailure {
                            message: format!("probe task failed: {}", e),
                        },
                    );
                }
            }
        }
        failures
    }
}

/// Turn a protocol result into a [`ToolOutput`]
///
/// Prefers the server's structured content when present; otherwise the text
/// payload is JSON-decoded with a raw-text fallback. A result the server
/// flagged as an error becomes an error instead of output.
fn decode_result(
    server: &str,
    tool: &str,
    result: CallToolResult,
) -> Result<ToolOutput, ClientError> {
    let text = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error.unwrap_or(false) {
        return Err(ClientError::Other(anyhow::anyhow!(
            "Tool '{}' on '{}' reported an error: {}",
            tool,
            server,
            text
        )));
    }

    if let Some(value) = result.structured_content {
        return Ok(ToolOutput::Structured(value));
    }
    Ok(ToolOutput::from_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_client() -> MultiMcpClient {
        MultiMcpClient::new(ConnectionTable::new())
    }

    #[tokio::test]
    async fn test_empty_table_lists_no_tools() {
        let mut client = empty_client();
        let tools = client.list_tools().await.unwrap();
        assert!(tools.is_empty());
        assert!(client.errored_servers().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_server_dispatch() {
        let mut client = empty_client();
        let result = client.call_tool("nope", "test-tool", None).await;
        assert!(matches!(result, Err(ClientError::UnknownServer(name)) if name == "nope"));
    }

    #[tokio::test]
    async fn test_nested_scopes_balance() {
        let mut client = empty_client();
        client.enter().await;
        client.enter().await;
        client.enter().await;
        client.exit().await.unwrap();
        client.exit().await.unwrap();
        client.exit().await.unwrap();
        // One more exit than enter is a caller bug
        assert!(matches!(
            client.exit().await,
            Err(ClientError::UnbalancedExit)
        ));
    }

    #[tokio::test]
    async fn test_exit_without_enter() {
        let mut client = empty_client();
        assert!(matches!(
            client.exit().await,
            Err(ClientError::UnbalancedExit)
        ));
    }

    #[tokio::test]
    async fn test_ping_with_no_servers() {
        let client = empty_client();
        assert!(client.ping_servers().await.is_empty());
    }

    #[test]
    fn test_decode_result_prefers_structured_content() {
        let result = CallToolResult {
            content: vec![],
            is_error: None,
            meta: Default::default(),
            structured_content: Some(serde_json::json!({"data": "Hello World!"})),
        };
        let output = decode_result("example", "test-tool", result).unwrap();
        assert_eq!(
            output,
            ToolOutput::Structured(serde_json::json!({"data": "Hello World!"}))
        );
    }

    #[test]
    fn test_decode_result_error_flag() {
        let result = CallToolResult {
            content: vec![],
            is_error: Some(true),
            meta: Default::default(),
            structured_content: None,
        };
        assert!(decode_result("example", "test-tool", result).is_err());
    }
}
