//! Transaction confirmation poller.
//!
//! Each attempt looks the transaction up by hash. "Not found" means the
//! transaction is not visible yet, so the poller waits for the next block
//! and tries again. Every other failure ends the poll at once.

use std::sync::Arc;

use crate::block::BlockWaiter;
use crate::client::ClientProvider;
use crate::context::CallContext;
use crate::error::ObserverError;
use crate::types::TxResult;

/// Confirms inclusion of submitted transactions.
#[derive(Clone)]
pub struct TxConfirmer {
    provider: Arc<dyn ClientProvider>,
    blocks: BlockWaiter,
    attempts: u32,
}

impl TxConfirmer {
    pub fn new(provider: Arc<dyn ClientProvider>, blocks: BlockWaiter, attempts: u32) -> Self {
        Self {
            provider,
            blocks,
            attempts,
        }
    }

    /// Poll until the transaction is included, returning its execution result
    /// whatever its result code.
    pub async fn confirm_transaction(
        &self,
        ctx: &CallContext,
        tx_hash: &str,
    ) -> Result<TxResult, ObserverError> {
        if tx_hash.trim().is_empty() {
            return Err(ObserverError::InvalidArgument("empty transaction hash".into()));
        }

        for attempt in 1..=self.attempts {
            let client = self.provider.current_client()?;
            match ctx.run(client.tx_by_hash(tx_hash)).await? {
                Ok(result) => {
                    tracing::debug!(
                        tx_hash,
                        attempt,
                        height = result.height,
                        code = result.code,
                        "transaction confirmed"
                    );
                    return Ok(result);
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(tx_hash, attempt, "transaction not yet included");
                }
                Err(e) => {
                    tracing::warn!(tx_hash, attempt, error = %e, "transaction lookup failed");
                    return Err(e.into());
                }
            }

            if attempt == self.attempts {
                break;
            }
            match self.blocks.wait_for_next_block(ctx).await {
                Ok(_) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    tracing::warn!(tx_hash, attempt, error = %e, "block wait failed, retrying lookup anyway");
                }
            }
        }

        Err(ObserverError::ConfirmationFailed {
            tx_hash: tx_hash.to_string(),
            attempts: self.attempts,
        })
    }
}
