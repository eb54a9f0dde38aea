use std::sync::Arc;

use keel_engine::EngineApi;
use keel_execution::{service::ExecutionService, state::BeaconState};
use tracing::warn;

use crate::{
    block::{BeaconBlock, PostBlockProcessor},
    errors::BlockchainError,
};

/// Validates incoming beacon blocks against the execution layer before
/// handing them to the rest of the chain-processing pipeline.
pub struct BlockchainService<E: EngineApi, B: BeaconBlock, P: PostBlockProcessor<B>> {
    execution: Arc<ExecutionService<E>>,
    post_processor: P,
    _block: std::marker::PhantomData<B>,
}

impl<E, B, P> BlockchainService<E, B, P>
where
    E: EngineApi + 'static,
    B: BeaconBlock,
    P: PostBlockProcessor<B>,
{
    pub fn new(execution: Arc<ExecutionService<E>>, post_processor: P) -> Self {
        BlockchainService {
            execution,
            post_processor,
            _block: std::marker::PhantomData,
        }
    }

    /// Validate and process one incoming block.
    ///
    /// The finalized-parent precondition and the engine's payload validation
    /// run concurrently; the first hard failure aborts both. An engine that
    /// answers accepted/syncing does not abort receipt: the block continues
    /// to post-processing with `is_valid_payload = false` and the soft error
    /// is returned afterwards so the caller can see it.
    pub async fn receive_beacon_block<S: BeaconState>(
        &self,
        state: &S,
        block: &B,
    ) -> Result<(), BlockchainError> {
        let receipt = tokio::try_join!(
            self.verify_finalized_parent(state, block),
            self.validate_execution_payload(block),
        );

        let (is_valid_payload, soft_error) = match receipt {
            Ok(((), is_valid_payload)) => (is_valid_payload, None),
            Err(err) if err.is_accepted_syncing() => {
                warn!(
                    slot = block.slot(),
                    "engine accepted the payload optimistically, continuing block receipt"
                );
                (false, Some(err))
            }
            Err(err) => return Err(err),
        };

        self.post_processor
            .post_block_process(block, is_valid_payload)
            .await
            .map_err(|err| BlockchainError::PostBlockProcessing(err.to_string()))?;

        match soft_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The block must build on the locally finalized execution block.
    async fn verify_finalized_parent<S: BeaconState>(
        &self,
        state: &S,
        block: &B,
    ) -> Result<(), BlockchainError> {
        let block_parent_hash = block.parent_execution_hash();
        let finalized_hash = state.finalized_eth1_block_hash();
        if block_parent_hash != finalized_hash {
            return Err(BlockchainError::ParentHashMismatch {
                block_parent_hash,
                finalized_hash,
            });
        }
        Ok(())
    }

    async fn validate_execution_payload(&self, block: &B) -> Result<bool, BlockchainError> {
        Ok(self
            .execution
            .notify_new_payload(block.execution_payload().clone())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use async_trait::async_trait;
    use keel_engine::errors::EngineError;
    use keel_execution::errors::ExecutionServiceError;
    use keel_execution_types::{
        PayloadId, Slot,
        execution_payload::{ExecutionPayload, ExecutionPayloadCapella},
        fork::ForkVersion,
        forkchoice::ForkchoiceState,
        payload_attributes::PayloadAttributes,
        responses::BuiltPayload,
        withdrawal::Withdrawal,
    };
    use keel_network_spec::networks::DEV;
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    use super::*;

    struct StubEngine {
        new_payload_result: Result<Option<B256>, EngineError>,
    }

    #[async_trait]
    impl EngineApi for StubEngine {
        async fn new_payload(
            &self,
            _payload: ExecutionPayload,
            _versioned_hashes: Vec<B256>,
            _parent_beacon_block_root: B256,
        ) -> Result<Option<B256>, EngineError> {
            self.new_payload_result.clone()
        }

        async fn forkchoice_updated(
            &self,
            _state: ForkchoiceState,
            _payload_attributes: Option<PayloadAttributes>,
        ) -> Result<(Option<PayloadId>, Option<B256>), EngineError> {
            unimplemented!("block receipt never updates forkchoice")
        }

        async fn get_payload(
            &self,
            _payload_id: PayloadId,
            _fork: ForkVersion,
        ) -> Result<BuiltPayload, EngineError> {
            unimplemented!("block receipt never fetches payloads")
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    struct StubState {
        finalized: B256,
    }

    impl BeaconState for StubState {
        fn slot(&self) -> Slot {
            4
        }

        fn finalized_eth1_block_hash(&self) -> B256 {
            self.finalized
        }

        fn safe_eth1_block_hash(&self) -> B256 {
            self.finalized
        }

        fn expected_withdrawals(&self) -> Vec<Withdrawal> {
            vec![]
        }
    }

    struct StubBlock {
        payload: ExecutionPayload,
    }

    impl StubBlock {
        fn with_parent(parent_hash: B256) -> Self {
            StubBlock {
                payload: ExecutionPayload::Capella(ExecutionPayloadCapella {
                    parent_hash,
                    ..Default::default()
                }),
            }
        }
    }

    impl BeaconBlock for StubBlock {
        fn slot(&self) -> Slot {
            4
        }

        fn execution_payload(&self) -> &ExecutionPayload {
            &self.payload
        }
    }

    #[derive(Default)]
    struct RecordingProcessor {
        calls: Mutex<Vec<bool>>,
    }

    #[async_trait]
    impl PostBlockProcessor<StubBlock> for RecordingProcessor {
        async fn post_block_process(
            &self,
            _block: &StubBlock,
            is_valid_payload: bool,
        ) -> anyhow::Result<()> {
            self.calls.lock().push(is_valid_payload);
            Ok(())
        }
    }

    fn service(
        new_payload_result: Result<Option<B256>, EngineError>,
    ) -> BlockchainService<StubEngine, StubBlock, RecordingProcessor> {
        let engine = Arc::new(StubEngine { new_payload_result });
        BlockchainService::new(
            Arc::new(ExecutionService::new(engine, DEV.clone())),
            RecordingProcessor::default(),
        )
    }

    const FINALIZED: B256 = B256::repeat_byte(0xfe);

    #[tokio::test]
    async fn valid_payload_flows_through_post_processing() {
        let service = service(Ok(Some(FINALIZED)));
        let state = StubState {
            finalized: FINALIZED,
        };
        let block = StubBlock::with_parent(FINALIZED);

        assert_eq!(service.receive_beacon_block(&state, &block).await, Ok(()));
        assert_eq!(*service.post_processor.calls.lock(), vec![true]);
    }

    #[traced_test]
    #[tokio::test]
    async fn accepted_syncing_is_swallowed_but_resurfaced() {
        let service = service(Err(EngineError::AcceptedSyncing));
        let state = StubState {
            finalized: FINALIZED,
        };
        let block = StubBlock::with_parent(FINALIZED);

        let result = service.receive_beacon_block(&state, &block).await;
        assert_eq!(
            result,
            Err(BlockchainError::Execution(ExecutionServiceError::Engine(
                EngineError::AcceptedSyncing
            )))
        );
        // Post-processing still ran, with the payload marked not-yet-valid.
        assert_eq!(*service.post_processor.calls.lock(), vec![false]);
        assert!(logs_contain(
            "engine accepted the payload optimistically"
        ));
    }

    #[tokio::test]
    async fn parent_hash_mismatch_aborts_before_post_processing() {
        let service = service(Ok(Some(FINALIZED)));
        let state = StubState {
            finalized: FINALIZED,
        };
        let block = StubBlock::with_parent(B256::repeat_byte(0x01));

        let result = service.receive_beacon_block(&state, &block).await;
        assert_eq!(
            result,
            Err(BlockchainError::ParentHashMismatch {
                block_parent_hash: B256::repeat_byte(0x01),
                finalized_hash: FINALIZED,
            })
        );
        assert!(service.post_processor.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn hard_engine_rejection_aborts_before_post_processing() {
        let service = service(Err(EngineError::InvalidPayloadStatus {
            latest_valid_hash: Some(FINALIZED),
        }));
        let state = StubState {
            finalized: FINALIZED,
        };
        let block = StubBlock::with_parent(FINALIZED);

        let result = service.receive_beacon_block(&state, &block).await;
        assert_eq!(
            result,
            Err(BlockchainError::Execution(ExecutionServiceError::Engine(
                EngineError::InvalidPayloadStatus {
                    latest_valid_hash: Some(FINALIZED),
                }
            )))
        );
        assert!(service.post_processor.calls.lock().is_empty());
    }
}
