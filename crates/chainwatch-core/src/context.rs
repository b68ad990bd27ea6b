//! Caller-supplied cancellation and deadline.
//!
//! Every suspend point and every chain query in the observer is raced
//! against [`CallContext::done`], so a cancelled call returns promptly
//! instead of finishing its sleep.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ObserverError;

/// Cancellation signal plus an optional deadline for one observer call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context cancelled through `token`.
    pub fn with_cancel(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// Same cancellation token, deadline `timeout` from now. An existing
    /// earlier deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the matching error if the context is already done.
    pub fn check(&self) -> Result<(), ObserverError> {
        if self.cancel.is_cancelled() {
            return Err(ObserverError::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Err(ObserverError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves once the caller cancels or the deadline passes.
    pub async fn done(&self) -> ObserverError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => ObserverError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ObserverError::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                ObserverError::Cancelled
            }
        }
    }

    /// Sleep for `duration` unless the context finishes first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ObserverError> {
        self.run(tokio::time::sleep(duration)).await
    }

    /// Drive `fut` to completion unless the context finishes first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, ObserverError> {
        self.check()?;
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_cancellation() {
        let ctx = CallContext::new();
        let start = Instant::now();
        ctx.sleep(Duration::from_secs(2)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_sleep() {
        let token = CancellationToken::new();
        let ctx = CallContext::with_cancel(token.clone());
        let start = Instant::now();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            token.cancel();
        });
        let err = ctx.sleep(Duration::from_secs(10)).await.unwrap_err();
        assert!(matches!(err, ObserverError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_sleep() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(1));
        let err = ctx.sleep(Duration::from_secs(10)).await.unwrap_err();
        assert!(matches!(err, ObserverError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn check_reports_prior_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = CallContext::with_cancel(token);
        assert!(matches!(ctx.check(), Err(ObserverError::Cancelled)));
        assert!(matches!(ctx.run(async { 1 }).await, Err(ObserverError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_deadline_wins() {
        let ctx = CallContext::new()
            .with_timeout(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(60));
        let deadline = ctx.deadline().unwrap();
        assert!(deadline <= Instant::now() + Duration::from_secs(1));
    }
}
