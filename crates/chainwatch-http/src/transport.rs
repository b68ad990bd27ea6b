//! The `GatewayTransport` trait and its `reqwest` implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::TransportError;

/// Issues read-only GET requests against a chain's REST gateway.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn GatewayTransport>`.
#[async_trait]
pub trait GatewayTransport: Send + Sync + 'static {
    /// GET `path` (relative to the base URL) and return the JSON body.
    async fn get(&self, path: &str) -> Result<Value, TransportError>;

    /// Base URL of the gateway.
    fn base_url(&self) -> &str;
}

/// Error body returned by gRPC-gateway endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayStatus {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub request_timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP gateway transport backed by `reqwest`.
///
/// Issues exactly one request per call; retrying is the caller's decision.
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, config: HttpTransportConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            request_timeout: config.request_timeout,
        })
    }

    pub fn default_for(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(base_url, HttpTransportConfig::default())
    }

    fn map_send_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl GatewayTransport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::trace!(%url, "gateway GET");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let http_status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;

        if !(200..300).contains(&http_status) {
            return Err(TransportError::from_status_body(http_status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::ClientErrorKind;

    #[test]
    fn status_body_with_grpc_code() {
        let err = TransportError::from_status_body(404, r#"{"code":5,"message":"tx not found: AB12","details":[]}"#);
        match &err {
            TransportError::Status { http_status, code, message } => {
                assert_eq!(*http_status, 404);
                assert_eq!(*code, 5);
                assert_eq!(message, "tx not found: AB12");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.kind(), ClientErrorKind::NotFound);
    }

    #[test]
    fn non_json_status_body() {
        let err = TransportError::from_status_body(502, "<html>Bad Gateway</html>");
        assert_eq!(err.kind(), ClientErrorKind::Transient);
    }

    #[test]
    fn trailing_slash_trimmed() {
        let t = HttpTransport::default_for("https://gateway.example.com/").unwrap();
        assert_eq!(t.base_url(), "https://gateway.example.com");
    }
}
