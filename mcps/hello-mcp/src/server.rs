//! MCP server implementation for the hello fixture

use rmcp::{
    handler::server::router::tool::ToolRouter,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use serde::Serialize;

/// The hello fixture MCP server
#[derive(Clone)]
pub struct HelloMcpServer {
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Serialize)]
struct HelloData {
    data: String,
}

#[tool_router]
impl HelloMcpServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(name = "test-tool", description = "A test tool description")]
    async fn test_tool(&self) -> Result<CallToolResult, McpError> {
        let data = HelloData {
            data: "Hello World!".to_string(),
        };
        let json = serde_json::to_string(&data)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for HelloMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Hello fixture MCP server - exposes a single test tool that returns \
                 a fixed JSON payload."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

impl Default for HelloMcpServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;

    #[test]
    fn test_router_exposes_test_tool() {
        let server = HelloMcpServer::new();
        let tools = server.tool_router.list_all();

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name.as_ref(), "test-tool");
    }

    #[tokio::test]
    async fn test_tool_returns_hello_payload() {
        let server = HelloMcpServer::new();
        let result = server.test_tool().await.unwrap();

        assert!(!result.is_error.unwrap_or(false));
        let text = match &result.content[0].raw {
            RawContent::Text(t) => t.text.to_string(),
            other => panic!("Expected text content, got {:?}", other),
        };
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({"data": "Hello World!"}));
    }
}
