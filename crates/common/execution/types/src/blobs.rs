use alloy_primitives::{Bytes, FixedBytes};
use serde::{Deserialize, Serialize};

pub type KzgCommitment = FixedBytes<48>;
pub type KzgProof = FixedBytes<48>;

/// Blobs, commitments and proofs returned by `engine_getPayloadV3` alongside
/// a Deneb payload. Passed through to the DA subsystem unmodified.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobsBundle {
    pub commitments: Vec<KzgCommitment>,
    pub proofs: Vec<KzgProof>,
    pub blobs: Vec<Bytes>,
}

/// Auxiliary blob data associated with a block, verified and persisted by the
/// DA processor rather than the block-receipt path.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobSidecar {
    #[serde(with = "serde_utils::u64_hex_be")]
    pub index: u64,
    pub blob: Bytes,
    pub kzg_commitment: KzgCommitment,
    pub kzg_proof: KzgProof,
}
