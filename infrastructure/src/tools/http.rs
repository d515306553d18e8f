//! HTTP backend: POSTs the call parameters as JSON
//!
//! Transport failures and gateway statuses (502, 503, 504) are reported as
//! connection errors so they count against the tool's health; any other
//! non-success status is an execution error.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use toolgate_application::{BackendError, ToolBackend};
use toolgate_domain::util::truncate_detail;

/// Maximum response body size (5 MB)
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

/// Response excerpt included in status errors (bytes)
const BODY_EXCERPT: usize = 512;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the client shared by every HTTP backend of a process
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("toolgate/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[derive(Debug, Clone)]
pub struct HttpToolBackend {
    client: reqwest::Client,
    url: String,
    health_url: Option<String>,
    bearer_token: Option<String>,
}

impl HttpToolBackend {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            health_url: None,
            bearer_token: None,
        }
    }

    pub fn with_health_url(mut self, url: impl Into<String>) -> Self {
        self.health_url = Some(url.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    async fn post(&self, params: &Value) -> Result<Value, BackendError> {
        let mut request = self.client.post(&self.url).json(params);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        if status.is_success()
            && let Some(length) = response.content_length()
            && length > MAX_BODY_SIZE as u64
        {
            return Err(too_large(length));
        }
        let body = response.bytes().await.map_err(classify)?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let excerpt = truncate_detail(text.trim(), BODY_EXCERPT);
            let message = format!("HTTP {}: {}", status.as_u16(), excerpt);
            return Err(if is_gateway_failure(status) {
                BackendError::Connection(message)
            } else {
                BackendError::Execution(message)
            });
        }

        // Chunked responses carry no length up front
        if body.len() > MAX_BODY_SIZE {
            return Err(too_large(body.len() as u64));
        }
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())))
    }
}

fn too_large(length: u64) -> BackendError {
    BackendError::Execution(format!(
        "response too large: {} bytes (max: {} bytes)",
        length, MAX_BODY_SIZE
    ))
}

fn is_gateway_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

fn classify(error: reqwest::Error) -> BackendError {
    if error.is_connect() || error.is_timeout() {
        BackendError::Connection(error.to_string())
    } else if error.is_builder() {
        BackendError::Misconfigured(error.to_string())
    } else {
        BackendError::Execution(error.to_string())
    }
}

#[async_trait]
impl ToolBackend for HttpToolBackend {
    fn label(&self) -> String {
        format!("http:{}", self.url)
    }

    async fn invoke(
        &self,
        params: &Value,
        cancellation: CancellationToken,
    ) -> Result<Value, BackendError> {
        tokio::select! {
            _ = cancellation.cancelled() => Err(BackendError::Cancelled),
            result = self.post(params) => result,
        }
    }

    /// `GET health_url` must succeed; without one, any non-5xx answer to
    /// `HEAD url` counts as alive.
    async fn ping(&self) -> Result<(), BackendError> {
        let (request, strict) = match &self.health_url {
            Some(url) => (self.client.get(url), true),
            None => (self.client.head(&self.url), false),
        };
        let status = request.send().await.map_err(classify)?.status();
        let alive = if strict {
            status.is_success()
        } else {
            !status.is_server_error()
        };
        if alive {
            Ok(())
        } else {
            Err(BackendError::Connection(format!("health check returned HTTP {}", status.as_u16())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpToolBackend {
        HttpToolBackend::new(build_client().unwrap(), format!("{}/call", server.uri()))
    }

    #[tokio::test]
    async fn test_posts_params_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({"q": "rust"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 3})))
            .mount(&server)
            .await;

        let value = backend(&server)
            .with_bearer_token("secret")
            .invoke(&json!({"q": "rust"}), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(value, json!({"hits": 3}));
    }

    #[tokio::test]
    async fn test_gateway_status_is_connection_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .invoke(&json!({}), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::Connection("HTTP 503: overloaded".to_string()));
    }

    #[tokio::test]
    async fn test_client_error_is_execution_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad query"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .invoke(&json!({}), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Execution(ref m) if m.contains("422")));
    }

    #[tokio::test]
    async fn test_refused_connection() {
        // Bind and release a port so nothing is listening on it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = HttpToolBackend::new(build_client().unwrap(), format!("http://{}/call", addr));
        let err = backend
            .invoke(&json!({}), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Connection(_)));
    }

    #[tokio::test]
    async fn test_oversized_response_rejected_by_length() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(MAX_BODY_SIZE + 1)))
            .mount(&server)
            .await;

        let err = backend(&server)
            .invoke(&json!({}), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, too_large(MAX_BODY_SIZE as u64 + 1));
    }

    #[tokio::test]
    async fn test_ping_uses_health_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let healthy = backend(&server).with_health_url(format!("{}/health", server.uri()));
        assert!(healthy.ping().await.is_ok());

        let missing = backend(&server).with_health_url(format!("{}/missing", server.uri()));
        assert!(matches!(missing.ping().await, Err(BackendError::Connection(_))));
    }
}
