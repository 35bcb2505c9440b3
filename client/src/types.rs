//! Shared types
//!
//! Tool descriptors and the dual-mode tool output.

use serde_json::Value;

/// A tool from an MCP server
#[derive(Debug, Clone)]
pub struct McpTool {
    /// Server this tool belongs to
    pub server: String,
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: Option<String>,
    /// Input schema (JSON)
    pub input_schema: Option<Value>,
}

/// Result of a tool invocation
///
/// Servers return text payloads; when the text parses as JSON the caller gets
/// the decoded structure, otherwise the raw text unchanged. Callers cannot
/// assume a fixed shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Structured(Value),
    Raw(String),
}

impl ToolOutput {
    /// Decode a text payload, falling back to the raw text
    pub(crate) fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Self::Structured(value),
            Err(_) => Self::Raw(text),
        }
    }

    /// The decoded structure, if the payload parsed as JSON
    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Raw(_) => None,
        }
    }
}
