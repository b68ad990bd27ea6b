//! Scripted in-memory chain for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{ChainClient, ClientProvider, StaticProvider};
use crate::error::ClientError;
use crate::types::{Height, ObjectInfo, ObjectStatus, TxResult};

/// Replays queued responses in order.
///
/// Once a queue runs dry: heights repeat the last value served, transactions
/// are not found, objects are reported as created but unsealed.
#[derive(Default)]
pub(crate) struct ScriptedChain {
    heights: Mutex<VecDeque<Result<Height, ClientError>>>,
    last_height: Mutex<Height>,
    txs: Mutex<VecDeque<Result<TxResult, ClientError>>>,
    objects: Mutex<VecDeque<Result<ObjectInfo, ClientError>>>,
    pub height_calls: AtomicUsize,
    pub tx_calls: AtomicUsize,
    pub object_calls: AtomicUsize,
}

impl ScriptedChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_height(&self, h: Height) {
        self.heights.lock().unwrap().push_back(Ok(h));
    }

    pub fn push_height_err(&self, err: ClientError) {
        self.heights.lock().unwrap().push_back(Err(err));
    }

    pub fn push_tx(&self, result: Result<TxResult, ClientError>) {
        self.txs.lock().unwrap().push_back(result);
    }

    pub fn push_object(&self, result: Result<ObjectInfo, ClientError>) {
        self.objects.lock().unwrap().push_back(result);
    }

    pub fn provider(self: &Arc<Self>) -> Arc<dyn ClientProvider> {
        Arc::new(StaticProvider::new(self.clone()))
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub(crate) fn tx(hash: &str, height: Height) -> TxResult {
    TxResult {
        hash: hash.into(),
        height,
        code: 0,
        codespace: String::new(),
        raw_log: String::new(),
        gas_wanted: 200_000,
        gas_used: 120_000,
    }
}

pub(crate) fn object(id: u64, status: ObjectStatus, is_updating: bool) -> ObjectInfo {
    ObjectInfo {
        id,
        bucket_name: "bucket".into(),
        object_name: format!("object-{id}"),
        owner: "0xowner".into(),
        payload_size: 4096,
        status,
        is_updating,
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn latest_block_height(&self) -> Result<Height, ClientError> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.heights.lock().unwrap().pop_front();
        let mut last = self.last_height.lock().unwrap();
        match next {
            Some(Ok(h)) => {
                *last = h;
                Ok(h)
            }
            Some(Err(e)) => Err(e),
            None => Ok(*last),
        }
    }

    async fn tx_by_hash(&self, tx_hash: &str) -> Result<TxResult, ClientError> {
        self.tx_calls.fetch_add(1, Ordering::SeqCst);
        self.txs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::not_found(format!("tx ({tx_hash}) not found"))))
    }

    async fn head_object_by_id(&self, object_id: u64) -> Result<ObjectInfo, ClientError> {
        self.object_calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(object(object_id, ObjectStatus::Created, false)))
    }

    fn endpoint(&self) -> &str {
        "scripted"
    }
}
