use alloy_primitives::B256;
use keel_execution::errors::ExecutionServiceError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockchainError {
    #[error(transparent)]
    Execution(#[from] ExecutionServiceError),

    #[error(
        "block builds on execution hash {block_parent_hash} but the finalized execution hash is {finalized_hash}"
    )]
    ParentHashMismatch {
        block_parent_hash: B256,
        finalized_hash: B256,
    },

    #[error("post-block processing failed: {0}")]
    PostBlockProcessing(String),
}

impl BlockchainError {
    pub fn is_accepted_syncing(&self) -> bool {
        matches!(self, BlockchainError::Execution(err) if err.is_accepted_syncing())
    }
}
