//! ChainWatch metrics definitions.
//!
//! All metrics use OpenTelemetry conventions. No exporter is installed here;
//! without one, the global meter is a no-op and recording costs nothing.

use std::time::Duration;

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// How a public observer operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Returned a usable result.
    Success,
    /// A poll budget or an internal deadline was exhausted.
    Timeout,
    /// The caller cancelled the call or its deadline passed.
    Cancelled,
    /// Any other failure.
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Central metrics handle for the observer.
#[derive(Clone)]
pub struct ObserverMetrics {
    pub calls: Counter<u64>,
    pub call_latency_ms: Histogram<f64>,
    pub poll_iterations: Counter<u64>,
}

impl ObserverMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            calls: meter
                .u64_counter("chainwatch.calls")
                .with_description("Completed observer operations by outcome")
                .build(),
            call_latency_ms: meter
                .f64_histogram("chainwatch.call_latency_ms")
                .with_description("Wall-clock duration of an observer operation in milliseconds")
                .build(),
            poll_iterations: meter
                .u64_counter("chainwatch.poll_iterations")
                .with_description("Individual poll iterations issued against the chain")
                .build(),
        }
    }

    /// Metrics bound to the process-wide meter named `chainwatch`.
    pub fn global() -> Self {
        Self::new(&global::meter("chainwatch"))
    }

    /// Record one finished call. Called exactly once per public operation.
    pub fn record_call(&self, op: &'static str, outcome: Outcome, elapsed: Duration) {
        self.calls.add(
            1,
            &[
                KeyValue::new("op", op),
                KeyValue::new("outcome", outcome.as_str()),
            ],
        );
        self.call_latency_ms
            .record(elapsed.as_secs_f64() * 1000.0, &[KeyValue::new("op", op)]);
    }

    pub fn record_iteration(&self, op: &'static str) {
        self.poll_iterations.add(1, &[KeyValue::new("op", op)]);
    }
}

impl Default for ObserverMetrics {
    fn default() -> Self {
        Self::global()
    }
}

impl std::fmt::Debug for ObserverMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverMetrics").finish_non_exhaustive()
    }
}
