//! Domain error taxonomy
//!
//! Every failure a caller can observe from the orchestration layer maps onto
//! one [`ToolError`] variant. The variants differ in how the rest of the
//! system reacts to them:
//!
//! | Variant | Retried | Feeds health | Auto-mode fallback |
//! |---------|---------|--------------|--------------------|
//! | `Configuration` | No | No | No (short-circuit) |
//! | `Connection` | Yes (live retries) | Yes | Yes |
//! | `Timeout` | Yes (live retries) | Yes | Yes |
//! | `ToolExecution` | No | No | Yes |
//!
//! `UnknownTool`, `DuplicateTool` and `InvalidDescriptor` are raised by the
//! registry and never reach the health or metrics machinery.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the tool orchestration layer
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ToolError {
    /// Required credentials or setup are missing. Never retried.
    #[error("Configuration error for tool '{tool}': {message}")]
    Configuration { tool: String, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid descriptor for tool '{tool}': {message}")]
    InvalidDescriptor { tool: String, message: String },

    /// The live backend could not be reached.
    #[error("Connection error for tool '{tool}': {message}")]
    Connection { tool: String, message: String },

    /// The live backend did not answer within its timeout.
    #[error("Tool '{tool}' timed out after {}ms", .timeout.as_millis())]
    Timeout {
        tool: String,
        #[serde(with = "crate::util::duration_ms")]
        timeout: Duration,
    },

    /// The implementation ran but reported a domain-level failure.
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },
}

impl ToolError {
    /// Name of the tool this error refers to
    pub fn tool_name(&self) -> &str {
        match self {
            ToolError::Configuration { tool, .. }
            | ToolError::InvalidDescriptor { tool, .. }
            | ToolError::Connection { tool, .. }
            | ToolError::Timeout { tool, .. }
            | ToolError::ToolExecution { tool, .. } => tool,
            ToolError::UnknownTool(tool) | ToolError::DuplicateTool(tool) => tool,
        }
    }

    /// Whether this error says something about the liveness of a backend
    pub fn is_liveness_signal(&self) -> bool {
        matches!(self, ToolError::Connection { .. } | ToolError::Timeout { .. })
    }

    /// Whether this error represents missing setup
    pub fn is_configuration(&self) -> bool {
        matches!(self, ToolError::Configuration { .. })
    }
}
