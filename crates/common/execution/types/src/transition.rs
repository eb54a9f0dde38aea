use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

/// Terminal proof-of-work transition parameters, compared field by field with
/// the engine via `engine_exchangeTransitionConfigurationV1`.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionConfiguration {
    #[serde(with = "serde_utils::u256_hex_be")]
    pub terminal_total_difficulty: U256,
    pub terminal_block_hash: B256,
    #[serde(with = "serde_utils::u64_hex_be")]
    pub terminal_block_number: u64,
}
