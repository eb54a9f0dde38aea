use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{
    PayloadId,
    blobs::BlobsBundle,
    execution_payload::{ExecutionPayload, ExecutionPayloadCapella, ExecutionPayloadDeneb},
    payload_status::PayloadStatusV1,
};

/// Raw `engine_forkchoiceUpdatedVX` response. The status object is optional
/// so that an engine returning nothing at all is distinguishable from one
/// returning an unknown status.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceUpdatedResponse {
    #[serde(default)]
    pub payload_status: Option<PayloadStatusV1>,
    #[serde(default)]
    pub payload_id: Option<PayloadId>,
}

#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPayloadV2Response {
    pub execution_payload: ExecutionPayloadCapella,
    #[serde(with = "serde_utils::u256_hex_be")]
    pub block_value: U256,
}

#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPayloadV3Response {
    pub execution_payload: ExecutionPayloadDeneb,
    #[serde(with = "serde_utils::u256_hex_be")]
    pub block_value: U256,
    pub blobs_bundle: BlobsBundle,
    pub should_override_builder: bool,
}

/// The unwrapped result of a `GetPayload` call, version-erased for the
/// block builder.
#[derive(Debug, PartialEq, Clone)]
pub struct BuiltPayload {
    pub execution_payload: ExecutionPayload,
    pub block_value: U256,
    pub blobs_bundle: Option<BlobsBundle>,
    pub should_override_builder: bool,
}

impl From<GetPayloadV2Response> for BuiltPayload {
    fn from(response: GetPayloadV2Response) -> Self {
        BuiltPayload {
            execution_payload: ExecutionPayload::Capella(response.execution_payload),
            block_value: response.block_value,
            blobs_bundle: None,
            should_override_builder: false,
        }
    }
}

impl From<GetPayloadV3Response> for BuiltPayload {
    fn from(response: GetPayloadV3Response) -> Self {
        BuiltPayload {
            execution_payload: ExecutionPayload::Deneb(response.execution_payload),
            block_value: response.block_value,
            blobs_bundle: Some(response.blobs_bundle),
            should_override_builder: response.should_override_builder,
        }
    }
}
