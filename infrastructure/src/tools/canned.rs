//! Canned backend: answers every call with a fixed value

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use toolgate_application::{BackendError, ToolBackend};

/// Degraded substitute returning a configured response.
///
/// A `null` response echoes the call parameters back under `params`, so
/// callers can tell which request the placeholder answered.
#[derive(Debug, Clone)]
pub struct CannedToolBackend {
    response: Value,
}

impl CannedToolBackend {
    pub fn new(response: Value) -> Self {
        Self { response }
    }

    pub fn echo() -> Self {
        Self::new(Value::Null)
    }
}

#[async_trait]
impl ToolBackend for CannedToolBackend {
    fn label(&self) -> String {
        "canned".to_string()
    }

    async fn invoke(
        &self,
        params: &Value,
        _cancellation: CancellationToken,
    ) -> Result<Value, BackendError> {
        if self.response.is_null() {
            return Ok(serde_json::json!({ "params": params }));
        }
        Ok(self.response.clone())
    }
}
