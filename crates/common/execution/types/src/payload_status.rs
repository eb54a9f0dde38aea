use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Engine API payload validation status.
///
/// `Unknown` is not part of the engine API wire enum; it is the parse result
/// for any status string this client does not recognize, and the default when
/// an engine omits the field entirely.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadStatus {
    Valid,
    Invalid,
    Syncing,
    Accepted,
    InvalidBlockHash,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PayloadStatus {
    /// Wire spelling of the status, also used as a metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadStatus::Valid => "VALID",
            PayloadStatus::Invalid => "INVALID",
            PayloadStatus::Syncing => "SYNCING",
            PayloadStatus::Accepted => "ACCEPTED",
            PayloadStatus::InvalidBlockHash => "INVALID_BLOCK_HASH",
            PayloadStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStatusV1 {
    #[serde(default)]
    pub status: PayloadStatus,
    #[serde(default)]
    pub latest_valid_hash: Option<B256>,
    #[serde(default)]
    pub validation_error: Option<String>,
}
