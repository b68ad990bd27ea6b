//! Height oracle — one query for the latest committed block height.

use std::sync::Arc;

use crate::client::ClientProvider;
use crate::context::CallContext;
use crate::error::ObserverError;
use crate::types::Height;

/// Reads the chain head through whichever client the provider hands back.
///
/// No retry happens here: a failed query is surfaced immediately and the
/// caller decides what to do with it.
#[derive(Clone)]
pub struct HeightOracle {
    provider: Arc<dyn ClientProvider>,
}

impl HeightOracle {
    pub fn new(provider: Arc<dyn ClientProvider>) -> Self {
        Self { provider }
    }

    pub async fn current_height(&self, ctx: &CallContext) -> Result<Height, ObserverError> {
        let client = self.provider.current_client()?;
        let height = ctx.run(client.latest_block_height()).await??;
        tracing::trace!(height, endpoint = client.endpoint(), "observed chain height");
        Ok(height)
    }
}
