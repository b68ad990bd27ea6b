//! Object lifecycle pollers: wait for an object to seal, or to disappear
//! after its upload was rejected.
//!
//! Both pollers share one bounded loop and differ only in which
//! [`ObjectState`] ends it:
//!
//! | Poller  | Terminal state       | Budget exhausted, last query ok | last query failed |
//! |---------|----------------------|---------------------------------|-------------------|
//! | seal    | `Sealed` (not updating) | `SealTimeout`                | that error        |
//! | reject  | `RejectedOrAbsent`   | `RejectUnsealTimeout`           | that error        |

use std::sync::Arc;
use std::time::Duration;

use chainwatch_observability::ObserverMetrics;

use crate::client::ClientProvider;
use crate::context::CallContext;
use crate::error::{ClientError, ObserverError};
use crate::types::ObjectState;

/// How a bounded poll ended.
#[derive(Debug)]
enum PollEnd {
    Reached,
    Exhausted { last_error: Option<ClientError> },
}

/// Polls the on-chain record of an object.
#[derive(Clone)]
pub struct ObjectWatcher {
    provider: Arc<dyn ClientProvider>,
    interval: Duration,
    metrics: Option<ObserverMetrics>,
}

impl ObjectWatcher {
    pub fn new(provider: Arc<dyn ClientProvider>, interval: Duration) -> Self {
        Self {
            provider,
            interval,
            metrics: None,
        }
    }

    /// Count every poll iteration in `metrics`.
    pub fn with_metrics(mut self, metrics: ObserverMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns `Ok(true)` once the object is sealed and not being updated.
    pub async fn listen_object_seal(
        &self,
        ctx: &CallContext,
        object_id: u64,
        max_iterations: u32,
    ) -> Result<bool, ObserverError> {
        let end = self
            .poll_until(ctx, "listen_object_seal", object_id, max_iterations, ObjectState::Sealed)
            .await?;
        match end {
            PollEnd::Reached => Ok(true),
            PollEnd::Exhausted { last_error: Some(e) } => Err(e.into()),
            PollEnd::Exhausted { last_error: None } => Err(ObserverError::SealTimeout {
                object_id,
                iterations: max_iterations,
            }),
        }
    }

    /// Returns `Ok(true)` once the chain reports the object no longer exists.
    pub async fn listen_reject_unseal_object(
        &self,
        ctx: &CallContext,
        object_id: u64,
        max_iterations: u32,
    ) -> Result<bool, ObserverError> {
        let end = self
            .poll_until(
                ctx,
                "listen_reject_unseal_object",
                object_id,
                max_iterations,
                ObjectState::RejectedOrAbsent,
            )
            .await?;
        match end {
            PollEnd::Reached => Ok(true),
            PollEnd::Exhausted { last_error: Some(e) } => Err(e.into()),
            PollEnd::Exhausted { last_error: None } => Err(ObserverError::RejectUnsealTimeout {
                object_id,
                iterations: max_iterations,
            }),
        }
    }

    async fn poll_until(
        &self,
        ctx: &CallContext,
        op: &'static str,
        object_id: u64,
        max_iterations: u32,
        terminal: ObjectState,
    ) -> Result<PollEnd, ObserverError> {
        if max_iterations == 0 {
            return Err(ObserverError::InvalidArgument(
                "max_iterations must be at least 1".into(),
            ));
        }

        let mut last_error = None;
        for iteration in 1..=max_iterations {
            if let Some(metrics) = &self.metrics {
                metrics.record_iteration(op);
            }
            let result = match self.provider.current_client() {
                Ok(client) => ctx.run(client.head_object_by_id(object_id)).await?,
                Err(e) => Err(e),
            };
            let state = ObjectState::observe(&result);
            tracing::debug!(op, object_id, iteration, ?state, "polled object");

            if state == terminal {
                return Ok(PollEnd::Reached);
            }
            last_error = result.err();

            if iteration < max_iterations {
                ctx.sleep(self.interval).await?;
            }
        }

        tracing::debug!(op, object_id, max_iterations, error = ?last_error, "poll budget exhausted");
        Ok(PollEnd::Exhausted { last_error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChainClient;
    use crate::mock::{object, ScriptedChain};
    use crate::types::ObjectStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Has no client to hand out for the first `outages` requests.
    struct UnavailableFor {
        chain: Arc<ScriptedChain>,
        outages: usize,
        requests: AtomicUsize,
    }

    impl ClientProvider for UnavailableFor {
        fn current_client(&self) -> Result<Arc<dyn ChainClient>, ClientError> {
            if self.requests.fetch_add(1, Ordering::SeqCst) < self.outages {
                return Err(ClientError::transient("no healthy endpoint available"));
            }
            Ok(self.chain.clone())
        }
    }

    fn flaky_watcher(chain: &Arc<ScriptedChain>, outages: usize) -> ObjectWatcher {
        let provider = UnavailableFor {
            chain: chain.clone(),
            outages,
            requests: AtomicUsize::new(0),
        };
        ObjectWatcher::new(Arc::new(provider), Duration::from_secs(1))
    }

    fn watcher(chain: &Arc<ScriptedChain>) -> ObjectWatcher {
        ObjectWatcher::new(chain.provider(), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn seal_waits_out_update() {
        let chain = ScriptedChain::new();
        chain.push_object(Ok(object(1, ObjectStatus::Created, false)));
        chain.push_object(Ok(object(1, ObjectStatus::Sealed, true)));
        chain.push_object(Ok(object(1, ObjectStatus::Sealed, false)));
        let sealed = watcher(&chain)
            .listen_object_seal(&CallContext::new(), 1, 10)
            .await
            .unwrap();
        assert!(sealed);
        assert_eq!(ScriptedChain::calls(&chain.object_calls), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn seal_timeout_when_never_sealed() {
        let chain = ScriptedChain::new();
        let err = watcher(&chain)
            .listen_object_seal(&CallContext::new(), 2, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, ObserverError::SealTimeout { object_id: 2, iterations: 4 }));
        assert_eq!(ScriptedChain::calls(&chain.object_calls), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn seal_surfaces_last_query_error() {
        let chain = ScriptedChain::new();
        chain.push_object(Ok(object(3, ObjectStatus::Created, false)));
        chain.push_object(Err(ClientError::transient("node unavailable")));
        let err = watcher(&chain)
            .listen_object_seal(&CallContext::new(), 3, 2)
            .await
            .unwrap_err();
        match err {
            ObserverError::Client(e) => assert_eq!(e.message, "node unavailable"),
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn seal_error_cleared_by_later_success() {
        let chain = ScriptedChain::new();
        chain.push_object(Err(ClientError::not_found("No such object")));
        chain.push_object(Ok(object(4, ObjectStatus::Created, false)));
        let err = watcher(&chain)
            .listen_object_seal(&CallContext::new(), 4, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, ObserverError::SealTimeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn reject_detected_on_first_iteration() {
        let chain = ScriptedChain::new();
        chain.push_object(Err(ClientError::not_found("No such object")));
        let start = Instant::now();
        let rejected = watcher(&chain)
            .listen_reject_unseal_object(&CallContext::new(), 5, 3)
            .await
            .unwrap();
        assert!(rejected);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn reject_timeout_while_object_persists() {
        let chain = ScriptedChain::new();
        let err = watcher(&chain)
            .listen_reject_unseal_object(&CallContext::new(), 6, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ObserverError::RejectUnsealTimeout { object_id: 6, iterations: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn reject_keeps_polling_through_other_errors() {
        let chain = ScriptedChain::new();
        chain.push_object(Err(ClientError::transient("timeout")));
        chain.push_object(Err(ClientError::not_found("No such object")));
        assert!(watcher(&chain)
            .listen_reject_unseal_object(&CallContext::new(), 7, 3)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn zero_iterations_rejected() {
        let chain = ScriptedChain::new();
        let err = watcher(&chain)
            .listen_object_seal(&CallContext::new(), 8, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ObserverError::InvalidArgument(_)));
        assert_eq!(ScriptedChain::calls(&chain.object_calls), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn seal_polls_through_provider_outage() {
        let chain = ScriptedChain::new();
        chain.push_object(Ok(object(9, ObjectStatus::Sealed, false)));
        let sealed = flaky_watcher(&chain, 3)
            .listen_object_seal(&CallContext::new(), 9, 10)
            .await
            .unwrap();
        assert!(sealed);
        assert_eq!(ScriptedChain::calls(&chain.object_calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_outage_on_last_iteration_is_reported() {
        let chain = ScriptedChain::new();
        let err = flaky_watcher(&chain, 5)
            .listen_reject_unseal_object(&CallContext::new(), 10, 3)
            .await
            .unwrap_err();
        match err {
            ObserverError::Client(e) => assert!(e.is_transient()),
            other => panic!("expected client error, got {other:?}"),
        }
        assert_eq!(ScriptedChain::calls(&chain.object_calls), 0);
    }
}
