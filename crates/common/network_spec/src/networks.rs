use std::sync::{Arc, LazyLock};

use alloy_primitives::{B256, U256, b256};
use keel_execution_types::{
    Epoch, Slot, fork::ForkVersion, transition::TransitionConfiguration,
};

pub const SLOTS_PER_EPOCH: u64 = 32;

/// An epoch value meaning "never activates on this network".
pub const UNSCHEDULED_EPOCH: Epoch = Epoch::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Dev,
}

/// Per-network chain parameters the execution bridge depends on. Everything
/// here is fixed at process start.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NetworkSpec {
    pub network: Network,
    /// Chain ID the connected execution client must report via `eth_chainId`.
    pub required_chain_id: u64,
    /// Hash of the eth1 genesis block, used as the parent for the first
    /// post-genesis payload build.
    pub genesis_eth1_hash: B256,
    pub capella_fork_epoch: Epoch,
    pub deneb_fork_epoch: Epoch,
    pub terminal_total_difficulty: U256,
    pub terminal_block_hash: B256,
    pub terminal_block_number: u64,
}

impl NetworkSpec {
    pub fn epoch_at_slot(&self, slot: Slot) -> Epoch {
        slot / SLOTS_PER_EPOCH
    }

    /// The newest fork active at `slot`.
    pub fn fork_at_slot(&self, slot: Slot) -> ForkVersion {
        self.fork_at_epoch(self.epoch_at_slot(slot))
    }

    pub fn fork_at_epoch(&self, epoch: Epoch) -> ForkVersion {
        if epoch >= self.deneb_fork_epoch {
            ForkVersion::Deneb
        } else {
            ForkVersion::Capella
        }
    }

    pub fn transition_configuration(&self) -> TransitionConfiguration {
        TransitionConfiguration {
            terminal_total_difficulty: self.terminal_total_difficulty,
            terminal_block_hash: self.terminal_block_hash,
            terminal_block_number: self.terminal_block_number,
        }
    }
}

pub static MAINNET: LazyLock<Arc<NetworkSpec>> = LazyLock::new(|| {
    NetworkSpec {
        network: Network::Mainnet,
        required_chain_id: 80094,
        genesis_eth1_hash: b256!(
            "0x0207661de38b0d4e1b5e3b7bcbdcb09e23acb9853f43f7b1b0e68b45e7ee7bdc"
        ),
        capella_fork_epoch: 0,
        deneb_fork_epoch: 0,
        terminal_total_difficulty: U256::ZERO,
        terminal_block_hash: B256::ZERO,
        terminal_block_number: 0,
    }
    .into()
});

pub static DEV: LazyLock<Arc<NetworkSpec>> = LazyLock::new(|| {
    NetworkSpec {
        network: Network::Dev,
        required_chain_id: 80087,
        genesis_eth1_hash: B256::ZERO,
        capella_fork_epoch: 0,
        deneb_fork_epoch: UNSCHEDULED_EPOCH,
        terminal_total_difficulty: U256::ZERO,
        terminal_block_hash: B256::ZERO,
        terminal_block_number: 0,
    }
    .into()
});
