//! Connection configuration
//!
//! A connection table maps server names to transport descriptors. Tables can
//! be built in code or loaded from a JSON file of the shape:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "sysinfo": { "transport": "stdio", "command": "./sysinfo-mcp" },
//!     "remote":  { "transport": "sse", "url": "http://localhost:9090/sse" }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Table of named server connections, fixed at client construction.
pub type ConnectionTable = BTreeMap<String, ConnectionConfig>;

/// How to reach a single MCP server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum ConnectionConfig {
    /// Spawn a child process and speak MCP over its stdio pipes
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        /// Environment for the child; values may reference `$VARS`
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// Connect to a streamable HTTP (SSE-style) endpoint
    Sse { url: String },
}

impl ConnectionConfig {
    /// Shorthand for a stdio connection with no env overrides
    pub fn stdio(command: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Stdio {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: HashMap::new(),
        }
    }

    /// Shorthand for an SSE connection
    pub fn sse(url: impl Into<String>) -> Self {
        Self::Sse { url: url.into() }
    }
}

/// Multi-server configuration (the `mcpServers` file format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(rename = "mcpServers")]
    pub servers: ConnectionTable,
}

impl McpConfig {
    /// Load a connection table from a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: McpConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_stdio_connection() {
        let json = r#"{
            "transport": "stdio",
            "command": "uv",
            "args": ["run", "server.py"],
            "env": { "API_KEY": "$API_KEY" }
        }"#;
        let config: ConnectionConfig = serde_json::from_str(json).unwrap();
        match config {
            ConnectionConfig::Stdio { command, args, env } => {
                assert_eq!(command, "uv");
                assert_eq!(args, vec!["run", "server.py"]);
                assert_eq!(env.get("API_KEY").map(String::as_str), Some("$API_KEY"));
            }
            other => panic!("Expected stdio connection, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_sse_connection() {
        let json = r#"{ "transport": "sse", "url": "http://localhost:9090/sse" }"#;
        let config: ConnectionConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(config, ConnectionConfig::Sse { ref url } if url == "http://localhost:9090/sse"));
    }

    #[test]
    fn test_stdio_args_and_env_default_empty() {
        let json = r#"{ "transport": "stdio", "command": "./hello-mcp" }"#;
        let config: ConnectionConfig = serde_json::from_str(json).unwrap();
        match config {
            ConnectionConfig::Stdio { args, env, .. } => {
                assert!(args.is_empty());
                assert!(env.is_empty());
            }
            other => panic!("Expected stdio connection, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "mcpServers": {{
                    "example": {{ "transport": "stdio", "command": "./hello-mcp" }},
                    "remote": {{ "transport": "sse", "url": "http://localhost:9090/sse" }}
                }}
            }}"#
        )
        .unwrap();

        let config = McpConfig::from_file(file.path()).unwrap();
        assert_eq!(config.servers.len(), 2);
        assert!(config.servers.contains_key("example"));
        assert!(config.servers.contains_key("remote"));
    }

    #[test]
    fn test_missing_config_file() {
        let result = McpConfig::from_file("/nonexistent/path/.mcp.json");
        assert!(result.is_err());
    }
}
