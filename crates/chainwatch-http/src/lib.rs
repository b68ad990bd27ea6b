//! chainwatch-http — a concrete chain client provider for ChainWatch.
//!
//! - [`GatewayTransport`] / [`HttpTransport`] — one GET per call against a
//!   Cosmos-SDK REST gateway, no hidden retries
//! - [`GatewayClient`] — implements `ChainClient`, mapping gateway JSON and
//!   gRPC status codes onto the observer's types and error kinds
//! - [`EndpointPool`] — implements `ClientProvider`, failing over between
//!   endpoints with per-endpoint health tracking

pub mod client;
pub mod error;
pub mod health;
pub mod pool;
pub mod transport;
pub mod wire;

pub use client::GatewayClient;
pub use error::TransportError;
pub use health::{EndpointHealth, EndpointStatus, HealthConfig};
pub use pool::{EndpointPool, PoolConfig};
pub use transport::{GatewayTransport, HttpTransport, HttpTransportConfig};
