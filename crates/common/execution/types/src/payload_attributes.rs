use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::{fork::ForkVersion, withdrawal::Withdrawal};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAttributesV2 {
    #[serde(with = "serde_utils::u64_hex_be")]
    pub timestamp: u64,
    pub prev_randao: B256,
    pub suggested_fee_recipient: Address,
    pub withdrawals: Vec<Withdrawal>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAttributesV3 {
    #[serde(with = "serde_utils::u64_hex_be")]
    pub timestamp: u64,
    pub prev_randao: B256,
    pub suggested_fee_recipient: Address,
    pub withdrawals: Vec<Withdrawal>,
    pub parent_beacon_block_root: B256,
}

/// Fork-versioned payload attributes container.
///
/// A container always carries a fork version; the inner attributes may be
/// absent, which serializes as JSON `null` and requests a head-only
/// forkchoice update without starting a payload build.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PayloadAttributes {
    Capella(Option<PayloadAttributesV2>),
    Deneb(Option<PayloadAttributesV3>),
}

impl PayloadAttributes {
    pub fn new(
        fork: ForkVersion,
        timestamp: u64,
        prev_randao: B256,
        suggested_fee_recipient: Address,
        withdrawals: Vec<Withdrawal>,
        parent_beacon_block_root: B256,
    ) -> Self {
        match fork {
            ForkVersion::Capella => PayloadAttributes::Capella(Some(PayloadAttributesV2 {
                timestamp,
                prev_randao,
                suggested_fee_recipient,
                withdrawals,
            })),
            ForkVersion::Deneb => PayloadAttributes::Deneb(Some(PayloadAttributesV3 {
                timestamp,
                prev_randao,
                suggested_fee_recipient,
                withdrawals,
                parent_beacon_block_root,
            })),
        }
    }

    /// An attributes container for a head-only forkchoice update.
    pub fn empty(fork: ForkVersion) -> Self {
        match fork {
            ForkVersion::Capella => PayloadAttributes::Capella(None),
            ForkVersion::Deneb => PayloadAttributes::Deneb(None),
        }
    }

    pub fn version(&self) -> ForkVersion {
        match self {
            PayloadAttributes::Capella(_) => ForkVersion::Capella,
            PayloadAttributes::Deneb(_) => ForkVersion::Deneb,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PayloadAttributes::Capella(inner) => inner.is_none(),
            PayloadAttributes::Deneb(inner) => inner.is_none(),
        }
    }

    /// Wire representation for the second `engine_forkchoiceUpdatedVX`
    /// parameter. Empty containers become `null`.
    pub fn to_wire_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        if self.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        match self {
            PayloadAttributes::Capella(inner) => serde_json::to_value(inner),
            PayloadAttributes::Deneb(inner) => serde_json::to_value(inner),
        }
    }
}
