//! Gateway JSON bodies and their mapping to `chainwatch-core` types.
//!
//! The gateway encodes 64-bit integers as JSON strings; [`str_or_num`]
//! accepts either form.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use chainwatch_core::{Height, ObjectInfo, ObjectStatus, TxResult};

use crate::error::TransportError;

fn str_or_num<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + Default + TryFrom<i128>,
    T::Err: std::fmt::Display,
{
    match Value::deserialize(de)? {
        Value::String(s) if s.is_empty() => Ok(T::default()),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("integer out of range: {n}"))),
        Value::Null => Ok(T::default()),
        other => Err(serde::de::Error::custom(format!("expected integer, got {other}"))),
    }
}

// ─── Latest block ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BlockHeader {
    #[serde(deserialize_with = "str_or_num")]
    height: u64,
}

#[derive(Debug, Deserialize)]
struct Block {
    header: BlockHeader,
}

#[derive(Debug, Deserialize)]
struct LatestBlockResponse {
    #[serde(default)]
    sdk_block: Option<Block>,
    #[serde(default)]
    block: Option<Block>,
}

/// Height from `GET /cosmos/base/tendermint/v1beta1/blocks/latest`.
pub fn latest_height(body: Value) -> Result<Height, TransportError> {
    let resp: LatestBlockResponse = serde_json::from_value(body)?;
    resp.sdk_block
        .or(resp.block)
        .map(|b| b.header.height)
        .ok_or_else(|| TransportError::Other("latest block response has no header".into()))
}

// ─── Transaction ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireTxResponse {
    txhash: String,
    #[serde(deserialize_with = "str_or_num")]
    height: u64,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    codespace: String,
    #[serde(default)]
    raw_log: String,
    #[serde(default, deserialize_with = "str_or_num")]
    gas_wanted: i64,
    #[serde(default, deserialize_with = "str_or_num")]
    gas_used: i64,
}

#[derive(Debug, Deserialize)]
struct GetTxResponse {
    tx_response: WireTxResponse,
}

/// Execution result from `GET /cosmos/tx/v1beta1/txs/{hash}`.
pub fn tx_result(body: Value) -> Result<TxResult, TransportError> {
    let resp: GetTxResponse = serde_json::from_value(body)?;
    let tx = resp.tx_response;
    Ok(TxResult {
        hash: tx.txhash,
        height: tx.height,
        code: tx.code,
        codespace: tx.codespace,
        raw_log: tx.raw_log,
        gas_wanted: tx.gas_wanted,
        gas_used: tx.gas_used,
    })
}

// ─── Object ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireObjectInfo {
    #[serde(deserialize_with = "str_or_num")]
    id: u64,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    bucket_name: String,
    #[serde(default)]
    object_name: String,
    #[serde(default, deserialize_with = "str_or_num")]
    payload_size: u64,
    #[serde(default)]
    object_status: String,
    #[serde(default)]
    is_updating: bool,
}

#[derive(Debug, Deserialize)]
struct HeadObjectResponse {
    object_info: Option<WireObjectInfo>,
}

/// Object record from `GET /greenfield/storage/head_object_by_id/{id}`.
pub fn object_info(body: Value) -> Result<ObjectInfo, TransportError> {
    let resp: HeadObjectResponse = serde_json::from_value(body)?;
    let info = resp
        .object_info
        .ok_or_else(|| TransportError::Other("head object response has no object_info".into()))?;
    Ok(ObjectInfo {
        id: info.id,
        bucket_name: info.bucket_name,
        object_name: info.object_name,
        owner: info.owner,
        payload_size: info.payload_size,
        status: ObjectStatus::from_chain_name(&info.object_status),
        is_updating: info.is_updating,
    })
}
