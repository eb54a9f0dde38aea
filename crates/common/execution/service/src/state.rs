use alloy_primitives::B256;
use keel_execution_types::{Slot, withdrawal::Withdrawal};

/// Read-only view of the beacon state fields payload building needs. The
/// concrete state type is owned by the state-transition pipeline; this trait
/// keeps the builder free of deep generic parameter chains.
pub trait BeaconState: Send + Sync {
    fn slot(&self) -> Slot;

    /// Execution-layer hash of the last finalized block.
    fn finalized_eth1_block_hash(&self) -> B256;

    /// Execution-layer hash of the current safe block.
    fn safe_eth1_block_hash(&self) -> B256;

    /// Withdrawals expected in the next payload.
    fn expected_withdrawals(&self) -> Vec<Withdrawal>;
}
