use alloy_primitives::B256;
use keel_engine::errors::EngineError;
use keel_execution_types::Slot;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("no cached payload id for slot {slot} with parent hash {parent_hash}")]
    PayloadNotFound { slot: Slot, parent_hash: B256 },

    /// The engine acknowledged build-triggering attributes but handed back
    /// no payload ID. Fatal for the current build.
    #[error("engine returned no payload id for head {head_eth1_hash} at slot {slot}")]
    NilPayloadId { slot: Slot, head_eth1_hash: B256 },

    #[error("forkchoice dispatch queue is no longer running")]
    DispatchClosed,
}

impl ExecutionServiceError {
    pub fn is_accepted_syncing(&self) -> bool {
        matches!(self, ExecutionServiceError::Engine(err) if err.is_accepted_syncing())
    }
}
