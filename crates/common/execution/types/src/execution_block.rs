use alloy_primitives::{B256, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::withdrawal::Withdrawal;

/// An execution-layer block header as returned by `eth_getBlockByHash` and
/// `eth_getBlockByNumber`. Only the fields this bridge inspects are kept.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionBlock {
    pub hash: B256,
    pub parent_hash: B256,
    #[serde(with = "serde_utils::u64_hex_be")]
    pub number: u64,
    #[serde(with = "serde_utils::u64_hex_be")]
    pub timestamp: u64,
    #[serde(default)]
    pub total_difficulty: Option<U256>,
}

/// A payload body from `engine_getPayloadBodiesBy{Hash,Range}V1`. Engines
/// return `null` entries for unknown blocks; callers normalize those to
/// empty bodies.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadBodyV1 {
    pub transactions: Vec<Bytes>,
    #[serde(default)]
    pub withdrawals: Option<Vec<Withdrawal>>,
}
