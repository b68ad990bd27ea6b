//! chainwatch-core — polling-based observation of chain state transitions.
//!
//! # Overview
//!
//! Chain nodes rarely offer a push API for the conditions an off-chain
//! service cares about. This crate turns point-in-time queries into
//! bounded, deterministic outcomes:
//!
//! ```text
//! ChainObserver
//!     ├── HeightOracle   (one height query, no retry)
//!     ├── BlockWaiter    (tick until height advances, or deadline)
//!     ├── TxConfirmer    (lookup → not found → wait a block → lookup …)
//!     └── ObjectWatcher  (seal / reject-unseal lifecycle polling)
//!             │
//!             ▼
//!       ClientProvider → ChainClient   (rotation lives behind this boundary)
//! ```
//!
//! Every loop is bounded by a caller-supplied budget and honours the
//! caller's [`CallContext`].

pub mod block;
pub mod client;
pub mod config;
pub mod confirm;
pub mod context;
pub mod error;
pub mod height;
pub mod object;
pub mod observer;
pub mod types;

#[cfg(test)]
mod mock;

pub use block::BlockWaiter;
pub use client::{ChainClient, ClientProvider, StaticProvider};
pub use config::ObserverConfig;
pub use confirm::TxConfirmer;
pub use context::CallContext;
pub use error::{ClientError, ClientErrorKind, ObserverError};
pub use height::HeightOracle;
pub use object::ObjectWatcher;
pub use observer::ChainObserver;
pub use types::{Height, ObjectInfo, ObjectState, ObjectStatus, TxResult};

pub use tokio_util::sync::CancellationToken;
