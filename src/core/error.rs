use thiserror::Error;

/// Per-request failures. These never end the dispatch loop; each one is
/// turned into a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid argument `{field}`: {reason}")]
    Validation { field: String, reason: String },
    #[error("{0}")]
    Handler(String),
}

impl ToolError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::Validation { field: field.into(), reason: reason.into() }
    }

    pub fn handler(message: impl Into<String>) -> Self {
        ToolError::Handler(message.into())
    }

    /// Stable error kind reported in `error.data.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "UnknownToolError",
            ToolError::Validation { .. } => "ValidationError",
            ToolError::Handler(_) => "HandlerError",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ToolError::UnknownTool(_) | ToolError::Validation { .. } => super::mcp::INVALID_PARAMS,
            ToolError::Handler(_) => super::mcp::TOOL_ERROR,
        }
    }

    pub fn data(&self) -> serde_json::Value {
        match self {
            ToolError::UnknownTool(tool) => {
                serde_json::json!({ "kind": self.kind(), "tool": tool })
            }
            ToolError::Validation { field, reason } => {
                serde_json::json!({ "kind": self.kind(), "field": field, "reason": reason })
            }
            ToolError::Handler(_) => serde_json::json!({ "kind": self.kind() }),
        }
    }
}

/// Registration-time failures; these surface before the loop starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool name must not be empty")]
    EmptyToolName,
    #[error("duplicate tool: {0}")]
    DuplicateTool(String),
}

/// Unrecoverable transport failures. Fatal for the process.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to read from input channel: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write to output channel: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}
