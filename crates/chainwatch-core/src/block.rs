//! Block-advance waiter.
//!
//! There is no push subscription for new blocks, so the waiter samples the
//! head height on a fixed tick until it reaches the target:
//!
//! ```text
//! h0 = height()            ── t = 0
//! tick → height() < target ── t = 1 × interval
//! tick → height() ≥ target ── done
//!            …
//! deadline                 ── BlockWaitTimeout
//! ```

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ObserverConfig;
use crate::context::CallContext;
use crate::error::ObserverError;
use crate::height::HeightOracle;
use crate::types::Height;

/// Waits for the chain head to advance.
#[derive(Clone)]
pub struct BlockWaiter {
    oracle: HeightOracle,
    poll_interval: Duration,
    timeout: Duration,
}

impl BlockWaiter {
    pub fn new(oracle: HeightOracle, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            oracle,
            poll_interval,
            timeout,
        }
    }

    /// Waiter using the tick and deadline from `config`.
    pub fn from_config(oracle: HeightOracle, config: &ObserverConfig) -> Self {
        Self::new(oracle, config.block_poll_interval(), config.block_wait_timeout())
    }

    pub fn oracle(&self) -> &HeightOracle {
        &self.oracle
    }

    /// Wait until at least one block past the current head is committed.
    pub async fn wait_for_next_block(&self, ctx: &CallContext) -> Result<Height, ObserverError> {
        self.wait_for_blocks(ctx, 1).await
    }

    /// Wait until the head is `delta` blocks past the height observed now.
    pub async fn wait_for_blocks(&self, ctx: &CallContext, delta: u64) -> Result<Height, ObserverError> {
        let started = Instant::now();
        let start = self.initial_height(ctx, started, None).await?;
        self.wait_from(ctx, started, start, start.saturating_add(delta)).await
    }

    /// Wait until the head reaches `target`.
    pub async fn wait_for_height(&self, ctx: &CallContext, target: Height) -> Result<Height, ObserverError> {
        let started = Instant::now();
        let start = self.initial_height(ctx, started, Some(target)).await?;
        if start >= target {
            return Ok(start);
        }
        self.wait_from(ctx, started, start, target).await
    }

    /// Starting height, queried under the wait deadline like every later sample.
    async fn initial_height(
        &self,
        ctx: &CallContext,
        started: Instant,
        target_height: Option<Height>,
    ) -> Result<Height, ObserverError> {
        match self.height_before(ctx, started + self.timeout).await? {
            Some(height) => Ok(height),
            None => Err(timed_out(started, None, target_height)),
        }
    }

    async fn wait_from(
        &self,
        ctx: &CallContext,
        started: Instant,
        start_height: Height,
        target_height: Height,
    ) -> Result<Height, ObserverError> {
        let deadline = started + self.timeout;
        let mut ticker = tokio::time::interval_at(started + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let timeout = || timed_out(started, Some(start_height), Some(target_height));

        tracing::debug!(start_height, target_height, "waiting for block");
        loop {
            tokio::select! {
                biased;
                err = ctx.done() => return Err(err),
                _ = tokio::time::sleep_until(deadline) => return Err(timeout()),
                _ = ticker.tick() => {}
            }

            let Some(height) = self.height_before(ctx, deadline).await? else {
                return Err(timeout());
            };
            if height >= target_height {
                tracing::debug!(height, target_height, "block advanced");
                return Ok(height);
            }
            if height < start_height {
                tracing::warn!(height, start_height, "observed height below starting height");
            }
        }
    }

    /// One height query raced against the caller's context and `deadline`.
    /// `None` means the deadline passed before the node answered.
    async fn height_before(&self, ctx: &CallContext, deadline: Instant) -> Result<Option<Height>, ObserverError> {
        tokio::select! {
            biased;
            err = ctx.done() => Err(err),
            _ = tokio::time::sleep_until(deadline) => Ok(None),
            height = self.oracle.current_height(ctx) => height.map(Some),
        }
    }
}

fn timed_out(started: Instant, start_height: Option<Height>, target_height: Option<Height>) -> ObserverError {
    ObserverError::BlockWaitTimeout {
        start_height,
        target_height,
        waited_ms: started.elapsed().as_millis() as u64,
    }
}

impl std::fmt::Debug for BlockWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockWaiter")
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}
