use alloy_primitives::B256;
use anyhow::Result;
use async_trait::async_trait;
use keel_execution_types::{Slot, execution_payload::ExecutionPayload};

/// The handful of beacon-block operations block receipt needs. Concrete
/// block types are owned by the state-transition pipeline.
pub trait BeaconBlock: Send + Sync {
    fn slot(&self) -> Slot;

    fn execution_payload(&self) -> &ExecutionPayload;

    /// The execution-layer parent hash the block claims to build on.
    fn parent_execution_hash(&self) -> B256 {
        self.execution_payload().parent_hash()
    }
}

/// Continuation of the chain-processing pipeline after execution-layer
/// validation: state transition, fork choice, storage.
#[async_trait]
pub trait PostBlockProcessor<B: BeaconBlock>: Send + Sync {
    async fn post_block_process(&self, block: &B, is_valid_payload: bool) -> Result<()>;
}
