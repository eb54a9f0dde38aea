use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// The consensus layer's view of the canonical execution chain, sent with
/// every `engine_forkchoiceUpdatedVX` call.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceState {
    pub head_block_hash: B256,
    pub safe_block_hash: B256,
    pub finalized_block_hash: B256,
}

impl ForkchoiceState {
    pub fn new(head_block_hash: B256, safe_block_hash: B256, finalized_block_hash: B256) -> Self {
        Self {
            head_block_hash,
            safe_block_hash,
            finalized_block_hash,
        }
    }
}
