use anyhow::Result;
use async_trait::async_trait;
use keel_execution_types::{Slot, blobs::BlobSidecar};

/// Durable store for blob sidecars that passed verification.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn persist(&self, slot: Slot, sidecars: Vec<BlobSidecar>) -> Result<()>;
}

/// KZG verification over a batch of blob sidecars. `kzg_offset` is the index
/// of the first commitment in the block body the batch corresponds to.
pub trait BlobVerifier: Send + Sync {
    fn verify_blobs(&self, sidecars: &[BlobSidecar], kzg_offset: usize) -> Result<()>;
}
