//! # chainwatch-observability
//!
//! Side-channel observability for the ChainWatch observer.
//!
//! ## Built-in metrics
//! - `chainwatch.calls`           — counter, tagged with op + outcome
//! - `chainwatch.call_latency_ms` — histogram, tagged with op
//! - `chainwatch.poll_iterations` — counter, tagged with op
//!
//! ## Structured logging
//! Text or JSON logs through `tracing-subscriber`, with per-component levels.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::{ObserverMetrics, Outcome};
pub use tracing_setup::{init_tracing, LogConfig};
