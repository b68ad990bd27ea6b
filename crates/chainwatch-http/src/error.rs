//! Transport-level error types and their classification.

use thiserror::Error;

use chainwatch_core::{ClientError, ClientErrorKind};

use crate::transport::GatewayStatus;

/// gRPC status codes carried in gateway error bodies.
pub mod grpc_code {
    pub const DEADLINE_EXCEEDED: i64 = 4;
    pub const NOT_FOUND: i64 = 5;
    pub const RESOURCE_EXHAUSTED: i64 = 8;
    pub const UNAVAILABLE: i64 = 14;
}

/// Errors that can occur while talking to a gateway.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, reset, TLS failure, etc.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The gateway answered with a non-success status.
    #[error("gateway status {http_status} (code {code}): {message}")]
    Status {
        http_status: u16,
        /// gRPC status code from the body, 0 if the body had none.
        code: i64,
        message: String,
    },

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Build a [`TransportError::Status`] from a non-success response body.
    /// Bodies that are not a gateway status object are kept as the message.
    pub fn from_status_body(http_status: u16, body: &str) -> Self {
        match serde_json::from_str::<GatewayStatus>(body) {
            Ok(status) => Self::Status {
                http_status,
                code: status.code,
                message: status.message,
            },
            Err(_) => Self::Status {
                http_status,
                code: 0,
                message: body.trim().to_string(),
            },
        }
    }

    /// Classify into the kind the observer's pollers switch on.
    pub fn kind(&self) -> ClientErrorKind {
        match self {
            Self::Http(_) | Self::Timeout { .. } => ClientErrorKind::Transient,
            Self::Status {
                http_status,
                code,
                message,
            } => classify_status(*http_status, *code, message),
            Self::Deserialization(_) | Self::Other(_) => ClientErrorKind::Fatal,
        }
    }

    /// Returns `true` if a later request to the same endpoint may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ClientErrorKind::Transient
    }
}

fn classify_status(http_status: u16, code: i64, message: &str) -> ClientErrorKind {
    match code {
        grpc_code::NOT_FOUND => return ClientErrorKind::NotFound,
        grpc_code::UNAVAILABLE | grpc_code::DEADLINE_EXCEEDED | grpc_code::RESOURCE_EXHAUSTED => {
            return ClientErrorKind::Transient
        }
        _ => {}
    }
    if http_status == 404 || mentions_missing_entity(message) {
        return ClientErrorKind::NotFound;
    }
    if http_status == 429 || http_status >= 500 {
        return ClientErrorKind::Transient;
    }
    ClientErrorKind::Fatal
}

// Some gateway builds wrap a missing tx/object as code 2 (unknown) with the
// original message. Keep recognising those texts until they stop doing that.
fn mentions_missing_entity(message: &str) -> bool {
    message.contains("not found") || message.contains("No such object")
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::new(e.kind(), e.to_string())
    }
}
