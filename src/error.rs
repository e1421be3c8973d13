//! Error types for stl-viewer-mcp
//!
//! Centralized error handling using thiserror. Only protocol-level failures
//! live here; domain failures (missing model file, viewer crash) are carried
//! as an `InvocationOutcome` instead.

use thiserror::Error;

/// All error types that can occur in the server
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Tool name is not advertised by the registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Required argument absent or empty
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    /// Configuration could not be resolved
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed protocol traffic
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ViewerError {
    /// Whether the error stems from a malformed call rather than a server fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::MissingArgument(_))
    }
}

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ViewerError>;
