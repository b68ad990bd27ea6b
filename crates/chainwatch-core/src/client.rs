//! The chain client boundary.
//!
//! The observer never owns connections. It asks a [`ClientProvider`] for the
//! current usable [`ChainClient`] before each query; endpoint rotation and
//! health tracking stay behind the provider.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::{Height, ObjectInfo, TxResult};

/// The queries the observation core issues against a chain node.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Latest committed block height.
    async fn latest_block_height(&self) -> Result<Height, ClientError>;

    /// Look up an included transaction. A transaction that is not (yet)
    /// included must fail with [`ClientErrorKind::NotFound`](crate::ClientErrorKind::NotFound).
    async fn tx_by_hash(&self, tx_hash: &str) -> Result<TxResult, ClientError>;

    /// Head an object by id. An object that does not exist must fail with
    /// [`ClientErrorKind::NotFound`](crate::ClientErrorKind::NotFound).
    async fn head_object_by_id(&self, object_id: u64) -> Result<ObjectInfo, ClientError>;

    /// Identifier of the node behind this client (URL or name).
    fn endpoint(&self) -> &str;
}

/// Supplies the client to use for the next query.
pub trait ClientProvider: Send + Sync + 'static {
    fn current_client(&self) -> Result<Arc<dyn ChainClient>, ClientError>;
}

/// A provider that always hands back the same client.
#[derive(Clone)]
pub struct StaticProvider {
    client: Arc<dyn ChainClient>,
}

impl StaticProvider {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }
}

impl ClientProvider for StaticProvider {
    fn current_client(&self) -> Result<Arc<dyn ChainClient>, ClientError> {
        Ok(self.client.clone())
    }
}

impl std::fmt::Debug for StaticProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticProvider")
            .field("endpoint", &self.client.endpoint())
            .finish()
    }
}
