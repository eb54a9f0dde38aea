use std::sync::Arc;

use alloy_primitives::B256;
use keel_engine::EngineApi;
use keel_execution_types::{
    PayloadId, Slot, execution_payload::ExecutionPayload, forkchoice::ForkchoiceState,
    payload_attributes::PayloadAttributes, responses::BuiltPayload,
};
use keel_network_spec::networks::NetworkSpec;
use keel_node::{BeaconService, ServiceStatus};
use tracing::{debug, warn};

use crate::{
    cache::PayloadIdCache, dispatch::SerialDispatchQueue, errors::ExecutionServiceError,
};

/// One forkchoice notification, carrying the slot the update is for so a
/// resulting payload build can be cached under it.
#[derive(Debug, Clone)]
pub struct ForkchoiceUpdateRequest {
    pub forkchoice_state: ForkchoiceState,
    pub payload_attributes: Option<PayloadAttributes>,
    pub slot: Slot,
}

/// Front door to the execution engine for the chain-processing pipeline.
///
/// Forkchoice notifications are funneled through a single-worker queue so
/// the engine's head-tracking state observes them in strict submission
/// order. Payload retrieval and validation are not serialized.
pub struct ExecutionService<E: EngineApi> {
    engine: Arc<E>,
    network_spec: Arc<NetworkSpec>,
    payload_id_cache: Arc<PayloadIdCache>,
    forkchoice_queue: SerialDispatchQueue,
}

impl<E: EngineApi + 'static> ExecutionService<E> {
    pub fn new(engine: Arc<E>, network_spec: Arc<NetworkSpec>) -> Self {
        ExecutionService {
            engine,
            network_spec,
            payload_id_cache: Arc::new(PayloadIdCache::default()),
            forkchoice_queue: SerialDispatchQueue::spawn(),
        }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn payload_id_cache(&self) -> &Arc<PayloadIdCache> {
        &self.payload_id_cache
    }

    /// Notify the engine of a new forkchoice state, optionally requesting a
    /// payload build. Blocks until the queued notification has completed and
    /// returns the payload ID when the engine started a build.
    pub async fn notify_forkchoice_update(
        &self,
        request: ForkchoiceUpdateRequest,
    ) -> Result<Option<PayloadId>, ExecutionServiceError> {
        let engine = self.engine.clone();
        let ForkchoiceUpdateRequest {
            forkchoice_state,
            payload_attributes,
            slot,
        } = request;
        let head_block_hash = forkchoice_state.head_block_hash;

        let result = self
            .forkchoice_queue
            .sync(
                async move { engine.forkchoice_updated(forkchoice_state, payload_attributes).await },
            )
            .await?;

        match result {
            Ok((payload_id, latest_valid_hash)) => {
                debug!(
                    slot,
                    %head_block_hash,
                    ?payload_id,
                    ?latest_valid_hash,
                    "forkchoice update acknowledged"
                );
                Ok(payload_id)
            }
            Err(err) if err.is_accepted_syncing() => {
                warn!(slot, %head_block_hash, "engine is syncing, forkchoice update is optimistic");
                Err(err.into())
            }
            Err(err) => {
                warn!(slot, %head_block_hash, ?err, "forkchoice update failed");
                Err(err.into())
            }
        }
    }

    /// Submit a payload for validation. Returns whether the engine deemed it
    /// valid; soft accepted/syncing statuses surface as errors for the
    /// caller to handle.
    ///
    /// Versioned hashes and the parent beacon block root are not yet
    /// threaded through from the block, so the engine sees empty values for
    /// every fork.
    pub async fn notify_new_payload(
        &self,
        payload: ExecutionPayload,
    ) -> Result<bool, ExecutionServiceError> {
        let block_hash = payload.block_hash();
        let latest_valid_hash = self.engine.new_payload(payload, vec![], B256::ZERO).await?;
        debug!(%block_hash, ?latest_valid_hash, "payload validated by the engine");
        Ok(latest_valid_hash.is_some())
    }

    /// Retrieve the payload previously requested for (slot, head hash).
    /// Fails with [`ExecutionServiceError::PayloadNotFound`] when no build
    /// was started for that key.
    pub async fn get_built_payload(
        &self,
        slot: Slot,
        head_eth1_hash: B256,
    ) -> Result<BuiltPayload, ExecutionServiceError> {
        let payload_id = self
            .payload_id_cache
            .get(slot, head_eth1_hash)
            .ok_or(ExecutionServiceError::PayloadNotFound {
                slot,
                parent_hash: head_eth1_hash,
            })?;
        self.get_payload(payload_id, slot).await
    }

    /// Fetch a payload by ID, selecting the engine method by the fork active
    /// at `slot`.
    pub async fn get_payload(
        &self,
        payload_id: PayloadId,
        slot: Slot,
    ) -> Result<BuiltPayload, ExecutionServiceError> {
        let fork = self.network_spec.fork_at_slot(slot);
        Ok(self.engine.get_payload(payload_id, fork).await?)
    }
}

impl<E: EngineApi + 'static> BeaconService for ExecutionService<E> {
    fn name(&self) -> &'static str {
        "execution"
    }

    fn status(&self) -> ServiceStatus {
        if self.engine.is_connected() {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        }
    }
}
