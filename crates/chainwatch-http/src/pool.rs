//! Multi-endpoint failover provider.
//!
//! The pool sticks to one endpoint while it is healthy and fails over to
//! the next available one when it gets quarantined. Clients it hands out
//! report their own transient failures back to the endpoint's health.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use chainwatch_core::{ChainClient, ClientError, ClientProvider, Height, ObjectInfo, TxResult};

use crate::client::GatewayClient;
use crate::health::{EndpointHealth, EndpointStatus, HealthConfig};
use crate::transport::{HttpTransport, HttpTransportConfig};

/// Configuration for the endpoint pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Health policy shared by every endpoint.
    pub health: HealthConfig,
    /// Timeout per individual gateway request.
    pub request_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            health: HealthConfig::default(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

struct Slot {
    client: Arc<dyn ChainClient>,
    health: Arc<EndpointHealth>,
}

/// Failover [`ClientProvider`] over several chain endpoints.
pub struct EndpointPool {
    slots: Vec<Slot>,
    active: AtomicUsize,
}

impl EndpointPool {
    pub fn new(clients: Vec<Arc<dyn ChainClient>>, config: PoolConfig) -> Self {
        let slots = clients
            .into_iter()
            .map(|client| Slot {
                client,
                health: Arc::new(EndpointHealth::new(config.health.clone())),
            })
            .collect();
        Self {
            slots,
            active: AtomicUsize::new(0),
        }
    }

    /// Build a pool of HTTP gateway clients, one per URL.
    pub fn http<I, S>(urls: I, config: PoolConfig) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let transport_config = HttpTransportConfig {
            request_timeout: config.request_timeout,
        };
        let clients = urls
            .into_iter()
            .map(|url| {
                let transport = HttpTransport::new(url, transport_config.clone())?;
                Ok(Arc::new(GatewayClient::new(transport)) as Arc<dyn ChainClient>)
            })
            .collect::<Result<Vec<_>, ClientError>>()?;
        if clients.is_empty() {
            return Err(ClientError::fatal("endpoint pool needs at least one URL"));
        }
        Ok(Self::new(clients, config))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(endpoint, status)` for every endpoint in the pool.
    pub fn health_summary(&self) -> Vec<(String, EndpointStatus)> {
        self.slots
            .iter()
            .map(|s| (s.client.endpoint().to_string(), s.health.status()))
            .collect()
    }

    /// Index of the slot to use: the active one if available, otherwise the
    /// next available one after it.
    fn select(&self) -> Option<usize> {
        let n = self.slots.len();
        if n == 0 {
            return None;
        }
        let active = self.active.load(Ordering::Relaxed) % n;
        for i in 0..n {
            let idx = (active + i) % n;
            if self.slots[idx].health.is_available() {
                if idx != active {
                    self.active.store(idx, Ordering::Relaxed);
                    tracing::warn!(
                        from = self.slots[active].client.endpoint(),
                        to = self.slots[idx].client.endpoint(),
                        "failing over to next endpoint"
                    );
                }
                return Some(idx);
            }
        }
        None
    }
}

impl ClientProvider for EndpointPool {
    fn current_client(&self) -> Result<Arc<dyn ChainClient>, ClientError> {
        let idx = self
            .select()
            .ok_or_else(|| ClientError::transient("no healthy endpoint available"))?;
        let slot = &self.slots[idx];
        Ok(Arc::new(TrackedClient {
            inner: slot.client.clone(),
            health: slot.health.clone(),
        }))
    }
}

/// Client wrapper that feeds call outcomes into the endpoint's health.
struct TrackedClient {
    inner: Arc<dyn ChainClient>,
    health: Arc<EndpointHealth>,
}

impl TrackedClient {
    fn observe<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        match &result {
            Err(e) if e.is_transient() => self.health.record_failure(),
            // The node answered, even if the answer was "not found" or a rejection.
            _ => self.health.record_success(),
        }
        result
    }
}

#[async_trait]
impl ChainClient for TrackedClient {
    async fn latest_block_height(&self) -> Result<Height, ClientError> {
        self.observe(self.inner.latest_block_height().await)
    }

    async fn tx_by_hash(&self, tx_hash: &str) -> Result<TxResult, ClientError> {
        self.observe(self.inner.tx_by_hash(tx_hash).await)
    }

    async fn head_object_by_id(&self, object_id: u64) -> Result<ObjectInfo, ClientError> {
        self.observe(self.inner.head_object_by_id(object_id).await)
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    struct MockClient {
        url: String,
        down: AtomicBool,
    }

    #[async_trait]
    impl ChainClient for MockClient {
        async fn latest_block_height(&self) -> Result<Height, ClientError> {
            if self.down.load(Ordering::SeqCst) {
                Err(ClientError::transient("connection refused"))
            } else {
                Ok(100)
            }
        }

        async fn tx_by_hash(&self, _tx_hash: &str) -> Result<TxResult, ClientError> {
            Err(ClientError::not_found("tx not found"))
        }

        async fn head_object_by_id(&self, _object_id: u64) -> Result<ObjectInfo, ClientError> {
            Err(ClientError::not_found("No such object"))
        }

        fn endpoint(&self) -> &str {
            &self.url
        }
    }

    fn mock(url: &str, down: bool) -> Arc<MockClient> {
        Arc::new(MockClient {
            url: url.to_string(),
            down: AtomicBool::new(down),
        })
    }

    fn pool(clients: &[Arc<MockClient>], threshold: u32) -> EndpointPool {
        EndpointPool::new(
            clients.iter().map(|c| c.clone() as Arc<dyn ChainClient>).collect(),
            PoolConfig {
                health: HealthConfig {
                    failure_threshold: threshold,
                    cooldown: Duration::from_secs(60),
                },
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn sticks_to_healthy_endpoint() {
        let a = mock("https://a", false);
        let b = mock("https://b", false);
        let pool = pool(&[a, b], 2);
        for _ in 0..3 {
            let client = pool.current_client().unwrap();
            assert_eq!(client.endpoint(), "https://a");
            client.latest_block_height().await.unwrap();
        }
    }

    #[tokio::test]
    async fn fails_over_after_threshold() {
        let a = mock("https://a", true);
        let b = mock("https://b", false);
        let pool = pool(&[a, b], 2);

        for _ in 0..2 {
            let client = pool.current_client().unwrap();
            assert_eq!(client.endpoint(), "https://a");
            assert!(client.latest_block_height().await.is_err());
        }
        let client = pool.current_client().unwrap();
        assert_eq!(client.endpoint(), "https://b");
        assert_eq!(client.latest_block_height().await.unwrap(), 100);

        let summary = pool.health_summary();
        assert_eq!(summary[0].1, EndpointStatus::Quarantined);
        assert_eq!(summary[1].1, EndpointStatus::Healthy);
    }

    #[tokio::test]
    async fn not_found_does_not_hurt_health() {
        let a = mock("https://a", false);
        let pool = pool(&[a], 1);
        let client = pool.current_client().unwrap();
        assert!(client.tx_by_hash("AB").await.unwrap_err().is_not_found());
        assert!(client.head_object_by_id(1).await.unwrap_err().is_not_found());
        assert_eq!(pool.health_summary()[0].1, EndpointStatus::Healthy);
    }

    #[tokio::test]
    async fn all_quarantined_is_transient_error() {
        let a = mock("https://a", true);
        let pool = pool(&[a], 1);
        let client = pool.current_client().unwrap();
        let _ = client.latest_block_height().await;
        let err = pool.current_client().err().unwrap();
        assert!(err.is_transient());
    }

    #[test]
    fn empty_pool_has_no_client() {
        let pool = EndpointPool::new(vec![], PoolConfig::default());
        assert!(pool.is_empty());
        assert!(pool.current_client().is_err());
    }

    #[test]
    fn http_pool_requires_urls() {
        let urls: Vec<String> = vec![];
        assert!(EndpointPool::http(urls, PoolConfig::default()).is_err());
        let pool = EndpointPool::http(["https://a.example", "https://b.example"], PoolConfig::default()).unwrap();
        assert_eq!(pool.len(), 2);
    }
}
