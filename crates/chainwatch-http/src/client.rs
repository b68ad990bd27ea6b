//! `ChainClient` over a Cosmos-SDK REST gateway.

use async_trait::async_trait;

use chainwatch_core::{ChainClient, ClientError, Height, ObjectInfo, TxResult};

use crate::transport::{GatewayTransport, HttpTransport};
use crate::wire;

const LATEST_BLOCK_PATH: &str = "/cosmos/base/tendermint/v1beta1/blocks/latest";
const TX_PATH: &str = "/cosmos/tx/v1beta1/txs";
const HEAD_OBJECT_BY_ID_PATH: &str = "/greenfield/storage/head_object_by_id";

/// Chain client that maps gateway responses onto the observer's data model.
pub struct GatewayClient<T> {
    transport: T,
}

impl<T: GatewayTransport> GatewayClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl GatewayClient<HttpTransport> {
    /// Client for `base_url` with default HTTP settings.
    pub fn http(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self::new(HttpTransport::default_for(base_url)?))
    }
}

/// Normalise a user-supplied hash for the gateway path.
fn normalize_hash(tx_hash: &str) -> Result<String, ClientError> {
    let hash = tx_hash.trim();
    let hash = hash
        .strip_prefix("0x")
        .or_else(|| hash.strip_prefix("0X"))
        .unwrap_or(hash);
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ClientError::fatal(format!("malformed transaction hash: {tx_hash:?}")));
    }
    Ok(hash.to_ascii_uppercase())
}

#[async_trait]
impl<T: GatewayTransport> ChainClient for GatewayClient<T> {
    async fn latest_block_height(&self) -> Result<Height, ClientError> {
        let body = self.transport.get(LATEST_BLOCK_PATH).await?;
        Ok(wire::latest_height(body)?)
    }

    async fn tx_by_hash(&self, tx_hash: &str) -> Result<TxResult, ClientError> {
        let hash = normalize_hash(tx_hash)?;
        let body = self.transport.get(&format!("{TX_PATH}/{hash}")).await?;
        Ok(wire::tx_result(body)?)
    }

    async fn head_object_by_id(&self, object_id: u64) -> Result<ObjectInfo, ClientError> {
        let body = self
            .transport
            .get(&format!("{HEAD_OBJECT_BY_ID_PATH}/{object_id}"))
            .await?;
        Ok(wire::object_info(body)?)
    }

    fn endpoint(&self) -> &str {
        self.transport.base_url()
    }
}
