//! Error taxonomy for chain clients and the pollers built on them.

use thiserror::Error;

use chainwatch_observability::Outcome;

/// Classification attached to every failed chain client call.
///
/// Pollers decide whether to retry by switching on this kind, never on the
/// error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// The queried entity does not exist (yet, or any more).
    NotFound,
    /// Retrying may succeed without intervention (network, unavailable node).
    Transient,
    /// The request itself is broken; retrying will not help.
    Fatal,
}

impl std::fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Transient => write!(f, "transient"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// A classified error returned by a [`ChainClient`](crate::ChainClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::NotFound, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Transient, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Fatal, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ClientErrorKind::NotFound
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ClientErrorKind::Transient
    }
}

/// Errors returned by the observer operations.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// A chain query failed and the failure was not absorbed by a retry loop.
    #[error("chain query failed: {0}")]
    Client(#[from] ClientError),

    /// Height did not reach the target before the block wait deadline.
    /// The heights are `None` when the node never answered the first query.
    #[error(
        "timeout exceeded waiting for height {} (started at {}, waited {waited_ms}ms)",
        show_height(.target_height),
        show_height(.start_height)
    )]
    BlockWaitTimeout {
        start_height: Option<u64>,
        target_height: Option<u64>,
        waited_ms: u64,
    },

    /// The transaction was still not visible after every attempt.
    #[error("failed to confirm transaction {tx_hash} after {attempts} attempts")]
    ConfirmationFailed { tx_hash: String, attempts: u32 },

    /// The object never reached a stable sealed state within the budget.
    #[error("object {object_id} was not sealed within {iterations} iterations")]
    SealTimeout { object_id: u64, iterations: u32 },

    /// The object was still present after every iteration.
    #[error("object {object_id} was not rejected within {iterations} iterations")]
    RejectUnsealTimeout { object_id: u64, iterations: u32 },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline elapsed before the operation finished.
    #[error("caller deadline exceeded")]
    DeadlineExceeded,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn show_height(height: &Option<u64>) -> String {
    height.map_or_else(|| "unknown".to_string(), |h| h.to_string())
}

impl ObserverError {
    /// Returns `true` for budget or internal-deadline exhaustion.
    /// Safe to interpret as "try again later".
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::BlockWaitTimeout { .. }
                | Self::ConfirmationFailed { .. }
                | Self::SealTimeout { .. }
                | Self::RejectUnsealTimeout { .. }
        )
    }

    /// Returns `true` if the caller cancelled or its deadline elapsed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns `true` for errors that should not be blindly retried.
    pub fn is_fatal(&self) -> bool {
        !self.is_timeout() && !self.is_cancelled()
    }

    /// Metrics outcome for this error.
    pub fn outcome(&self) -> Outcome {
        if self.is_timeout() {
            Outcome::Timeout
        } else if self.is_cancelled() {
            Outcome::Cancelled
        } else {
            Outcome::Error
        }
    }
}
