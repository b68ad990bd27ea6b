//! Per-endpoint health: quarantine an endpoint after repeated transient
//! failures, then let a single probe decide whether it comes back.
//!
//! ```text
//! Healthy ──(failure_threshold consecutive failures)──▶ Quarantined
//! Quarantined ──(cooldown elapsed)──▶ Probing
//! Probing ──(success)──▶ Healthy
//! Probing ──(failure)──▶ Quarantined
//! ```

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Observable endpoint status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStatus {
    Healthy,
    Quarantined,
    Probing,
}

impl std::fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Quarantined => write!(f, "quarantined"),
            Self::Probing => write!(f, "probing"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Consecutive transient failures before quarantine.
    pub failure_threshold: u32,
    /// How long a quarantined endpoint is skipped.
    pub cooldown: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct HealthInner {
    status: EndpointStatus,
    consecutive_failures: u32,
    quarantined_at: Option<Instant>,
}

/// Thread-safe health tracker for one endpoint.
#[derive(Debug)]
pub struct EndpointHealth {
    config: HealthConfig,
    inner: Mutex<HealthInner>,
}

impl EndpointHealth {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(HealthInner {
                status: EndpointStatus::Healthy,
                consecutive_failures: 0,
                quarantined_at: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HealthInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current status, moving Quarantined → Probing once the cooldown is over.
    pub fn status(&self) -> EndpointStatus {
        let mut inner = self.lock();
        if inner.status == EndpointStatus::Quarantined {
            let expired = inner
                .quarantined_at
                .map_or(true, |at| at.elapsed() >= self.config.cooldown);
            if expired {
                inner.status = EndpointStatus::Probing;
                tracing::info!("endpoint cooldown over, probing");
            }
        }
        inner.status
    }

    pub fn is_available(&self) -> bool {
        self.status() != EndpointStatus::Quarantined
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.status != EndpointStatus::Healthy {
            tracing::info!("endpoint recovered");
        }
        inner.status = EndpointStatus::Healthy;
        inner.consecutive_failures = 0;
        inner.quarantined_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        let quarantine = match inner.status {
            EndpointStatus::Probing => true,
            EndpointStatus::Healthy => inner.consecutive_failures >= self.config.failure_threshold,
            EndpointStatus::Quarantined => false,
        };
        if quarantine {
            inner.status = EndpointStatus::Quarantined;
            inner.quarantined_at = Some(Instant::now());
            tracing::warn!(failures = inner.consecutive_failures, "endpoint quarantined");
        }
    }
}
