//! `ChainObserver` — the service-facing entry point.
//!
//! Every public operation runs through [`ChainObserver::instrumented`], which
//! records one metrics sample and one log event per call, whichever way the
//! call ends.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use chainwatch_observability::{ObserverMetrics, Outcome};

use crate::block::BlockWaiter;
use crate::client::ClientProvider;
use crate::config::ObserverConfig;
use crate::confirm::TxConfirmer;
use crate::context::CallContext;
use crate::error::ObserverError;
use crate::height::HeightOracle;
use crate::object::ObjectWatcher;
use crate::types::{Height, TxResult};

/// Stateless, poll-driven observer of chain state transitions.
///
/// Cheap to clone; clones share the provider and metrics handles.
#[derive(Clone)]
pub struct ChainObserver {
    config: ObserverConfig,
    oracle: HeightOracle,
    blocks: BlockWaiter,
    confirmer: TxConfirmer,
    objects: ObjectWatcher,
    metrics: ObserverMetrics,
}

impl ChainObserver {
    /// Build an observer recording into the global `chainwatch` meter.
    pub fn new(provider: Arc<dyn ClientProvider>, config: ObserverConfig) -> Result<Self, ObserverError> {
        Self::with_metrics(provider, config, ObserverMetrics::global())
    }

    pub fn with_metrics(
        provider: Arc<dyn ClientProvider>,
        config: ObserverConfig,
        metrics: ObserverMetrics,
    ) -> Result<Self, ObserverError> {
        config.validate()?;
        let oracle = HeightOracle::new(provider.clone());
        let blocks = BlockWaiter::from_config(oracle.clone(), &config);
        let confirmer = TxConfirmer::new(provider.clone(), blocks.clone(), config.confirm_attempts);
        let objects = ObjectWatcher::new(provider, config.object_poll_interval()).with_metrics(metrics.clone());
        Ok(Self {
            config,
            oracle,
            blocks,
            confirmer,
            objects,
            metrics,
        })
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Latest committed block height. Not retried.
    pub async fn current_height(&self, ctx: &CallContext) -> Result<Height, ObserverError> {
        self.instrumented("current_height", self.oracle.current_height(ctx))
            .await
    }

    /// Block until the head moves past the height observed at call time.
    /// Returns the height that satisfied the wait.
    pub async fn wait_for_next_block(&self, ctx: &CallContext) -> Result<Height, ObserverError> {
        self.instrumented("wait_for_next_block", self.blocks.wait_for_next_block(ctx))
            .await
    }

    /// Block until the head reaches `target`, within the block wait deadline.
    pub async fn wait_for_height(&self, ctx: &CallContext, target: Height) -> Result<Height, ObserverError> {
        self.instrumented("wait_for_height", self.blocks.wait_for_height(ctx, target))
            .await
    }

    pub async fn confirm_transaction(&self, ctx: &CallContext, tx_hash: &str) -> Result<TxResult, ObserverError> {
        self.instrumented(
            "confirm_transaction",
            self.confirmer.confirm_transaction(ctx, tx_hash),
        )
        .await
    }

    pub async fn listen_object_seal(
        &self,
        ctx: &CallContext,
        object_id: u64,
        max_iterations: u32,
    ) -> Result<bool, ObserverError> {
        self.instrumented(
            "listen_object_seal",
            self.objects.listen_object_seal(ctx, object_id, max_iterations),
        )
        .await
    }

    pub async fn listen_reject_unseal_object(
        &self,
        ctx: &CallContext,
        object_id: u64,
        max_iterations: u32,
    ) -> Result<bool, ObserverError> {
        self.instrumented(
            "listen_reject_unseal_object",
            self.objects
                .listen_reject_unseal_object(ctx, object_id, max_iterations),
        )
        .await
    }

    async fn instrumented<T, F>(&self, op: &'static str, fut: F) -> Result<T, ObserverError>
    where
        F: Future<Output = Result<T, ObserverError>>,
    {
        recorded(&self.metrics, op, fut).await
    }
}

/// Sink for one sample per finished call.
trait CallRecorder {
    fn record(&self, op: &'static str, outcome: Outcome, elapsed: Duration);
}

impl CallRecorder for ObserverMetrics {
    fn record(&self, op: &'static str, outcome: Outcome, elapsed: Duration) {
        self.record_call(op, outcome, elapsed);
    }
}

async fn recorded<R, T, F>(recorder: &R, op: &'static str, fut: F) -> Result<T, ObserverError>
where
    R: CallRecorder,
    F: Future<Output = Result<T, ObserverError>>,
{
    let call = InFlightCall {
        recorder,
        op,
        started: Instant::now(),
        finished: false,
    };
    let result = fut.await;
    call.finish(&result);
    result
}

/// A public call in progress. Dropped unfinished, it records the call as
/// cancelled, so every call yields exactly one sample.
struct InFlightCall<'a, R: CallRecorder> {
    recorder: &'a R,
    op: &'static str,
    started: Instant,
    finished: bool,
}

impl<R: CallRecorder> InFlightCall<'_, R> {
    fn finish<T>(mut self, result: &Result<T, ObserverError>) {
        self.finished = true;
        let op = self.op;
        let elapsed = self.started.elapsed();
        let outcome = match result {
            Ok(_) => Outcome::Success,
            Err(e) => e.outcome(),
        };
        self.recorder.record(op, outcome, elapsed);
        match result {
            Ok(_) => tracing::debug!(op, elapsed_ms = elapsed.as_millis() as u64, "call succeeded"),
            Err(e) => tracing::info!(
                op,
                %outcome,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "call failed"
            ),
        }
    }
}

impl<R: CallRecorder> Drop for InFlightCall<'_, R> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let elapsed = self.started.elapsed();
        self.recorder.record(self.op, Outcome::Cancelled, elapsed);
        tracing::info!(
            op = self.op,
            outcome = %Outcome::Cancelled,
            elapsed_ms = elapsed.as_millis() as u64,
            "call dropped before completion"
        );
    }
}

impl std::fmt::Debug for ChainObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainObserver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
