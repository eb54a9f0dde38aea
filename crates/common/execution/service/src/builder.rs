use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy_primitives::{Address, B256};
use keel_engine::EngineApi;
use keel_execution_types::{
    Slot, forkchoice::ForkchoiceState, payload_attributes::PayloadAttributes,
    responses::BuiltPayload,
};
use keel_metrics::{
    GET_PAYLOAD_ERROR, NIL_PAYLOAD_ID, PAYLOAD_ID_CACHE_HIT, PAYLOAD_ID_CACHE_MISS,
    helpers::inc_counter_vec,
};
use keel_network_spec::networks::NetworkSpec;
use tracing::{info, warn};

use crate::{
    errors::ExecutionServiceError,
    service::{ExecutionService, ForkchoiceUpdateRequest},
    state::BeaconState,
};

/// Requests payload builds from the local execution engine and retrieves the
/// results, with a cache-first fast path keyed by (slot, parent eth1 hash).
pub struct LocalPayloadBuilder<E: EngineApi> {
    execution: Arc<ExecutionService<E>>,
    network_spec: Arc<NetworkSpec>,
    suggested_fee_recipient: Address,
}

impl<E: EngineApi + 'static> LocalPayloadBuilder<E> {
    pub fn new(
        execution: Arc<ExecutionService<E>>,
        network_spec: Arc<NetworkSpec>,
        suggested_fee_recipient: Address,
    ) -> Self {
        LocalPayloadBuilder {
            execution,
            network_spec,
            suggested_fee_recipient,
        }
    }

    /// Return the payload for `slot`, reusing an in-flight build when one is
    /// cached. A failed retrieval of a cached build falls through to a fresh
    /// build rather than failing the request.
    pub async fn get_or_build_local_payload<S: BeaconState>(
        &self,
        state: &S,
        slot: Slot,
    ) -> Result<BuiltPayload, ExecutionServiceError> {
        let parent_eth1_hash = self.parent_eth1_hash(state, slot);

        if let Some(payload_id) = self.execution.payload_id_cache().get(slot, parent_eth1_hash) {
            inc_counter_vec(&PAYLOAD_ID_CACHE_HIT, &[]);
            match self.execution.get_payload(payload_id, slot).await {
                Ok(payload) => return Ok(payload),
                Err(err) => {
                    inc_counter_vec(&GET_PAYLOAD_ERROR, &[]);
                    warn!(
                        slot,
                        %parent_eth1_hash,
                        ?err,
                        "cached payload build could not be retrieved, rebuilding"
                    );
                }
            }
        } else {
            inc_counter_vec(&PAYLOAD_ID_CACHE_MISS, &[]);
        }

        self.build_local_payload(state, slot, parent_eth1_hash).await
    }

    /// Start a payload build for `slot` on top of `parent_eth1_hash` and
    /// wait for the engine to hand the payload back.
    pub async fn build_local_payload<S: BeaconState>(
        &self,
        state: &S,
        slot: Slot,
        parent_eth1_hash: B256,
    ) -> Result<BuiltPayload, ExecutionServiceError> {
        let fork = self.network_spec.fork_at_slot(slot);
        // Randao mix and the parent beacon block root are zeroed until the
        // proposer pipeline threads them through.
        let payload_attributes = PayloadAttributes::new(
            fork,
            unix_timestamp_secs(),
            B256::ZERO,
            self.suggested_fee_recipient,
            state.expected_withdrawals(),
            B256::ZERO,
        );
        let forkchoice_state = ForkchoiceState::new(
            parent_eth1_hash,
            state.safe_eth1_block_hash(),
            state.finalized_eth1_block_hash(),
        );

        let payload_id = self
            .execution
            .notify_forkchoice_update(ForkchoiceUpdateRequest {
                forkchoice_state,
                payload_attributes: Some(payload_attributes),
                slot,
            })
            .await?;

        let Some(payload_id) = payload_id else {
            inc_counter_vec(&NIL_PAYLOAD_ID, &[]);
            return Err(ExecutionServiceError::NilPayloadId {
                slot,
                head_eth1_hash: parent_eth1_hash,
            });
        };
        self.execution
            .payload_id_cache()
            .set(slot, parent_eth1_hash, payload_id);
        info!(slot, %parent_eth1_hash, %payload_id, "payload build started");

        self.execution.get_payload(payload_id, slot).await
    }

    /// Parent for the build: the eth1 genesis block for the first slot,
    /// the finalized execution hash from consensus state afterwards.
    fn parent_eth1_hash<S: BeaconState>(&self, state: &S, slot: Slot) -> B256 {
        if slot == 1 {
            self.network_spec.genesis_eth1_hash
        } else {
            state.finalized_eth1_block_hash()
        }
    }
}

fn unix_timestamp_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use keel_engine::errors::EngineError;
    use keel_execution_types::withdrawal::Withdrawal;
    use keel_network_spec::networks::DEV;

    use super::*;
    use crate::service::test_utils::{MockEngine, test_built_payload, test_payload_id};

    struct StubState {
        slot: Slot,
        finalized: B256,
        safe: B256,
    }

    impl BeaconState for StubState {
        fn slot(&self) -> Slot {
            self.slot
        }

        fn finalized_eth1_block_hash(&self) -> B256 {
            self.finalized
        }

        fn safe_eth1_block_hash(&self) -> B256 {
            self.safe
        }

        fn expected_withdrawals(&self) -> Vec<Withdrawal> {
            vec![]
        }
    }

    fn builder(engine: Arc<MockEngine>) -> LocalPayloadBuilder<MockEngine> {
        LocalPayloadBuilder::new(
            Arc::new(ExecutionService::new(engine, DEV.clone())),
            DEV.clone(),
            Address::repeat_byte(0x42),
        )
    }

    #[tokio::test]
    async fn first_slot_builds_on_the_genesis_hash() {
        let engine = Arc::new(MockEngine::default());
        let builder = builder(engine.clone());
        let state = StubState {
            slot: 1,
            finalized: B256::repeat_byte(0xff),
            safe: B256::repeat_byte(0xee),
        };

        builder
            .get_or_build_local_payload(&state, 1)
            .await
            .expect("build should succeed");

        let calls = engine.forkchoice_calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.head_block_hash, DEV.genesis_eth1_hash);
    }

    #[tokio::test]
    async fn later_slots_build_on_the_finalized_hash() {
        let engine = Arc::new(MockEngine::default());
        let builder = builder(engine.clone());
        let finalized = B256::repeat_byte(0xff);
        let state = StubState {
            slot: 2,
            finalized,
            safe: B256::repeat_byte(0xee),
        };

        builder
            .get_or_build_local_payload(&state, 2)
            .await
            .expect("build should succeed");

        let calls = engine.forkchoice_calls.lock();
        assert_eq!(calls[0].0.head_block_hash, finalized);
    }

    #[tokio::test]
    async fn cache_hit_failure_falls_through_to_a_rebuild() {
        let engine = Arc::new(MockEngine::default());
        // First retrieval (cache hit) fails; the rebuild's retrieval
        // succeeds.
        engine
            .get_payload_responses
            .lock()
            .push_back(Err(EngineError::UnknownPayload("expired".to_string())));
        engine
            .get_payload_responses
            .lock()
            .push_back(Ok(test_built_payload(11)));
        let builder = builder(engine.clone());
        let finalized = B256::repeat_byte(0xff);
        let state = StubState {
            slot: 4,
            finalized,
            safe: finalized,
        };
        builder
            .execution
            .payload_id_cache()
            .set(4, finalized, test_payload_id(9));

        let payload = builder
            .get_or_build_local_payload(&state, 4)
            .await
            .expect("fallthrough rebuild should succeed");
        assert_eq!(payload, test_built_payload(11));

        // One forkchoice update for the rebuild, two payload retrievals.
        assert_eq!(engine.forkchoice_calls.lock().len(), 1);
        assert_eq!(engine.get_payload_calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn missing_payload_id_after_attributes_is_fatal() {
        let engine = Arc::new(MockEngine::default());
        engine
            .forkchoice_responses
            .lock()
            .push_back(Ok((None, Some(B256::ZERO))));
        let builder = builder(engine);
        let finalized = B256::repeat_byte(0xff);
        let state = StubState {
            slot: 4,
            finalized,
            safe: finalized,
        };

        assert_eq!(
            builder.get_or_build_local_payload(&state, 4).await,
            Err(ExecutionServiceError::NilPayloadId {
                slot: 4,
                head_eth1_hash: finalized,
            })
        );
    }

    #[tokio::test]
    async fn successful_build_caches_the_payload_id() {
        let engine = Arc::new(MockEngine::default());
        engine
            .forkchoice_responses
            .lock()
            .push_back(Ok((Some(test_payload_id(5)), Some(B256::ZERO))));
        let builder = builder(engine);
        let finalized = B256::repeat_byte(0xff);
        let state = StubState {
            slot: 6,
            finalized,
            safe: finalized,
        };

        builder
            .get_or_build_local_payload(&state, 6)
            .await
            .expect("build should succeed");
        assert_eq!(
            builder.execution.payload_id_cache().get(6, finalized),
            Some(test_payload_id(5))
        );
    }
}
