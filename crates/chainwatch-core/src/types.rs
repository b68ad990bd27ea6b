//! Transient data model: everything here is observed per call, nothing is stored.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Latest committed block number as seen by one node at query time.
pub type Height = u64;

/// Execution result of an included transaction.
///
/// Inclusion is what the confirmation poller guarantees; a non-zero `code`
/// still counts as confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    pub hash: String,
    pub height: Height,
    pub code: u32,
    pub codespace: String,
    pub raw_log: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
}

impl TxResult {
    /// Returns `true` if the transaction executed without error.
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// On-chain lifecycle status of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStatus {
    Created,
    Sealed,
    Discontinued,
    Unspecified,
}

impl ObjectStatus {
    /// Parse the chain's enum name (`OBJECT_STATUS_SEALED`, ...). Unknown names
    /// map to [`ObjectStatus::Unspecified`].
    pub fn from_chain_name(name: &str) -> Self {
        match name.trim_start_matches("OBJECT_STATUS_") {
            "CREATED" => Self::Created,
            "SEALED" => Self::Sealed,
            "DISCONTINUED" => Self::Discontinued,
            _ => Self::Unspecified,
        }
    }
}

impl std::fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Sealed => write!(f, "sealed"),
            Self::Discontinued => write!(f, "discontinued"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// The on-chain record of a stored object, as returned by a head-by-id query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub id: u64,
    pub bucket_name: String,
    pub object_name: String,
    pub owner: String,
    pub payload_size: u64,
    pub status: ObjectStatus,
    /// Set while a replacement payload is being uploaded over a sealed object.
    pub is_updating: bool,
}

impl ObjectInfo {
    /// Sealed and not mid-update. Only this counts as a terminal seal.
    pub fn is_stably_sealed(&self) -> bool {
        self.status == ObjectStatus::Sealed && !self.is_updating
    }
}

/// Classification of one object-info query inside a lifecycle poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    /// Record exists but is not (stably) sealed.
    UnsealedPending,
    Sealed,
    /// The chain reports no such object.
    RejectedOrAbsent,
    /// Any other query failure.
    TransientError,
}

impl ObjectState {
    pub fn observe(result: &Result<ObjectInfo, ClientError>) -> Self {
        match result {
            Ok(info) if info.is_stably_sealed() => Self::Sealed,
            Ok(_) => Self::UnsealedPending,
            Err(e) if e.is_not_found() => Self::RejectedOrAbsent,
            Err(_) => Self::TransientError,
        }
    }
}
