//! Error types
//!
//! Per-server connection failures are captured, not raised: they live in the
//! client's error table and only surface when a caller targets that specific
//! server. Everything else propagates immediately.

use std::time::Duration;

use thiserror::Error;

/// A captured per-server connection failure
///
/// Stored in the error table after a connection pass. Cloneable so a table
/// entry can be wrapped into a [`ClientError::ServerConnection`] without
/// being moved out.
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    #[error("initialization timed out after {timeout:?}")]
    InitTimeout { timeout: Duration },

    #[error("{message}")]
    InitFailure { message: String },
}

impl ConnectError {
    pub(crate) fn failure(err: anyhow::Error) -> Self {
        Self::InitFailure {
            message: format!("{:#}", err),
        }
    }
}

/// Errors surfaced to callers of the client API
#[derive(Debug, Error)]
pub enum ClientError {
    /// The target server failed its connection attempt; wraps the captured error
    #[error("server '{server}' is not connected")]
    ServerConnection {
        server: String,
        #[source]
        source: ConnectError,
    },

    /// The target server was never configured
    #[error("unknown server '{0}'")]
    UnknownServer(String),

    /// The server is connected but has no tool with that name
    #[error("no tool named '{tool}' on server '{server}'")]
    ToolNotFound { server: String, tool: String },

    /// `exit()` called more times than `enter()`
    #[error("exit() called without a matching enter()")]
    UnbalancedExit,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_connection_wraps_source() {
        let err = ClientError::ServerConnection {
            server: "example".to_string(),
            source: ConnectError::InitTimeout {
                timeout: Duration::from_millis(500),
            },
        };
        assert!(err.to_string().contains("example"));
        let source = std::error::Error::source(&err).expect("should carry the captured error");
        assert!(source.to_string().contains("timed out"));
    }

    #[test]
    fn test_connect_error_is_cloneable() {
        let err = ConnectError::InitFailure {
            message: "spawn failed".to_string(),
        };
        let clone = err.clone();
        assert_eq!(clone.to_string(), "spawn failed");
    }
}
