//! Tool backend port
//!
//! A [`ToolBackend`] is one concrete way of answering a tool call: the live
//! external service, or the degraded substitute that returns canned or
//! simulated data. The registry holds at most one of each per tool.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolgate_domain::ToolError;

/// Errors a backend can report for a single call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached (refused, reset, DNS, spawn failure)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The backend was reached but reported a failure
    #[error("Execution failed: {0}")]
    Execution(String),

    /// The backend cannot run with the parameters or settings it was given
    #[error("Misconfigured: {0}")]
    Misconfigured(String),

    #[error("Cancelled")]
    Cancelled,
}

impl BackendError {
    /// Attach the tool name and map into the domain error.
    ///
    /// Only connection failures count as liveness signals; everything else
    /// becomes a tool execution error.
    pub fn into_tool_error(self, tool: &str) -> ToolError {
        match self {
            BackendError::Connection(message) => ToolError::Connection {
                tool: tool.to_string(),
                message,
            },
            BackendError::Execution(message) => ToolError::ToolExecution {
                tool: tool.to_string(),
                message,
            },
            BackendError::Misconfigured(message) => ToolError::ToolExecution {
                tool: tool.to_string(),
                message: format!("misconfigured: {}", message),
            },
            BackendError::Cancelled => ToolError::ToolExecution {
                tool: tool.to_string(),
                message: "cancelled".to_string(),
            },
        }
    }
}

/// Port for a concrete tool implementation
///
/// Implementations should stop work promptly once `cancellation` fires; the
/// dispatcher cancels the token when a call times out or its workflow is
/// abandoned.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Short label used in logs (e.g. `http:https://api.example.com/search`)
    fn label(&self) -> String;

    /// Perform one call
    async fn invoke(
        &self,
        params: &Value,
        cancellation: CancellationToken,
    ) -> Result<Value, BackendError>;

    /// Lightweight liveness check used by the health prober.
    ///
    /// The default reports success, which suits substitutes and in-process
    /// backends.
    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// The live and degraded implementations registered for one tool
#[derive(Clone, Default)]
pub struct ToolImplementations {
    pub live: Option<Arc<dyn ToolBackend>>,
    pub degraded: Option<Arc<dyn ToolBackend>>,
}

impl ToolImplementations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_live(mut self, backend: Arc<dyn ToolBackend>) -> Self {
        self.live = Some(backend);
        self
    }

    pub fn with_degraded(mut self, backend: Arc<dyn ToolBackend>) -> Self {
        self.degraded = Some(backend);
        self
    }
}

impl std::fmt::Debug for ToolImplementations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolImplementations")
            .field("live", &self.live.as_ref().map(|b| b.label()))
            .field("degraded", &self.degraded.as_ref().map(|b| b.label()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connection_is_liveness_signal() {
        let connection = BackendError::Connection("refused".into()).into_tool_error("search");
        assert!(connection.is_liveness_signal());

        for error in [
            BackendError::Execution("500".into()),
            BackendError::Misconfigured("bad url".into()),
            BackendError::Cancelled,
        ] {
            let mapped = error.into_tool_error("search");
            assert!(!mapped.is_liveness_signal(), "{:?}", mapped);
            assert_eq!(mapped.tool_name(), "search");
        }
    }
}
