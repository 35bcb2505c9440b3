//! Multi-server MCP client
//!
//! Connects to a named set of MCP servers concurrently, aggregates their
//! tools into one catalog, and dispatches calls to the right server. A server
//! that fails to connect or initialize within its timeout is isolated: its
//! error is captured per name and only surfaces when that server is targeted,
//! while the rest of the table keeps working.
//!
//! ```rust,ignore
//! use mcp_multi_client::{ConnectionConfig, MultiMcpClient};
//!
//! let mut servers = std::collections::BTreeMap::new();
//! servers.insert("example".into(), ConnectionConfig::stdio("./hello-mcp", [] as [&str; 0]));
//!
//! let mut client = MultiMcpClient::new(servers);
//! client.enter().await;
//! let tools = client.list_tools().await?;
//! let out = client.call_tool("example", "test-tool", None).await?;
//! client.exit().await?;
//! ```

mod client;
mod config;
mod connect;
mod error;
mod types;

pub use client::MultiMcpClient;
pub use config::{ConnectionConfig, ConnectionTable, McpConfig};
pub use error::{ClientError, ConnectError};
pub use types::{McpTool, ToolOutput};
