pub mod auth;
pub mod errors;
pub mod rpc;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use alloy_primitives::B256;
use async_trait::async_trait;
use keel_execution_types::{
    PayloadId,
    execution_block::{ExecutionBlock, ExecutionPayloadBodyV1},
    execution_payload::ExecutionPayload,
    fork::ForkVersion,
    forkchoice::ForkchoiceState,
    payload_attributes::PayloadAttributes,
    payload_status::{PayloadStatus, PayloadStatusV1},
    responses::{
        BuiltPayload, ForkchoiceUpdatedResponse, GetPayloadV2Response, GetPayloadV3Response,
    },
    transition::TransitionConfiguration,
};
use keel_metrics::{FORKCHOICE_STATUS, helpers::inc_counter_vec};
use keel_network_spec::{engine::EngineConfig, networks::NetworkSpec};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::{auth::JwtSigner, errors::EngineError, rpc::RpcClient};

pub const ENGINE_NEW_PAYLOAD_V2: &str = "engine_newPayloadV2";
pub const ENGINE_NEW_PAYLOAD_V3: &str = "engine_newPayloadV3";
pub const ENGINE_FORKCHOICE_UPDATED_V2: &str = "engine_forkchoiceUpdatedV2";
pub const ENGINE_FORKCHOICE_UPDATED_V3: &str = "engine_forkchoiceUpdatedV3";
pub const ENGINE_GET_PAYLOAD_V2: &str = "engine_getPayloadV2";
pub const ENGINE_GET_PAYLOAD_V3: &str = "engine_getPayloadV3";
pub const ENGINE_GET_PAYLOAD_BODIES_BY_HASH_V1: &str = "engine_getPayloadBodiesByHashV1";
pub const ENGINE_GET_PAYLOAD_BODIES_BY_RANGE_V1: &str = "engine_getPayloadBodiesByRangeV1";
pub const ENGINE_EXCHANGE_CAPABILITIES: &str = "engine_exchangeCapabilities";
pub const ENGINE_EXCHANGE_TRANSITION_CONFIGURATION_V1: &str =
    "engine_exchangeTransitionConfigurationV1";
pub const ETH_CHAIN_ID: &str = "eth_chainId";
pub const ETH_GET_BLOCK_BY_HASH: &str = "eth_getBlockByHash";
pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";

/// Engine methods this client may call, announced during the capability
/// handshake.
pub const CAPABILITIES: &[&str] = &[
    ENGINE_NEW_PAYLOAD_V2,
    ENGINE_NEW_PAYLOAD_V3,
    ENGINE_FORKCHOICE_UPDATED_V2,
    ENGINE_FORKCHOICE_UPDATED_V3,
    ENGINE_GET_PAYLOAD_V2,
    ENGINE_GET_PAYLOAD_V3,
    ENGINE_GET_PAYLOAD_BODIES_BY_HASH_V1,
    ENGINE_GET_PAYLOAD_BODIES_BY_RANGE_V1,
];

/// The execution-engine operations the beacon side depends on. The production
/// implementation is [`EngineClient`]; tests substitute mocks.
#[async_trait]
pub trait EngineApi: Send + Sync {
    /// Submit a payload for validation. `Ok` carries the engine's latest
    /// valid hash.
    async fn new_payload(
        &self,
        payload: ExecutionPayload,
        versioned_hashes: Vec<B256>,
        parent_beacon_block_root: B256,
    ) -> Result<Option<B256>, EngineError>;

    /// Update the engine's forkchoice, optionally kicking off a payload
    /// build. `Ok` carries the payload ID (when a build was started) and the
    /// engine's latest valid hash.
    async fn forkchoice_updated(
        &self,
        state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> Result<(Option<PayloadId>, Option<B256>), EngineError>;

    /// Fetch a previously requested payload build.
    async fn get_payload(
        &self,
        payload_id: PayloadId,
        fork: ForkVersion,
    ) -> Result<BuiltPayload, EngineError>;

    fn is_connected(&self) -> bool;
}

/// Authenticated client for an execution engine's `engine_` and `eth_`
/// namespaces, with fork-aware method dispatch.
pub struct EngineClient {
    rpc: RpcClient,
    config: EngineConfig,
    network_spec: Arc<NetworkSpec>,
    connected: AtomicBool,
}

impl EngineClient {
    pub fn new(config: EngineConfig, network_spec: Arc<NetworkSpec>) -> anyhow::Result<Self> {
        let jwt_signer = JwtSigner::from_file(&config.jwt_secret_path)?;
        let rpc = RpcClient::new(config.rpc_dial_url.clone(), jwt_signer, config.rpc_timeout);
        Ok(EngineClient {
            rpc,
            config,
            network_spec,
            connected: AtomicBool::new(false),
        })
    }

    /// Perform the startup handshake: verify the chain ID, announce
    /// capabilities, and exchange the transition configuration. Marks the
    /// client connected on success.
    pub async fn connect(&self) -> Result<(), EngineError> {
        if self.is_connected() {
            return Ok(());
        }

        self.verify_chain_id().await?;

        let capabilities = self.exchange_capabilities().await?;
        debug!(?capabilities, "engine capabilities exchanged");

        self.exchange_transition_configuration().await?;

        self.connected.store(true, Ordering::Release);
        info!(url = %self.config.rpc_dial_url, "connected to execution engine");
        Ok(())
    }

    /// Periodically re-verify the engine connection, re-dialing quickly
    /// while unreachable and slowly once healthy. Connection state changes
    /// are logged once per transition; authentication failures are logged on
    /// every tick.
    pub async fn connection_monitor(self: Arc<Self>) {
        loop {
            let was_connected = self.is_connected();
            match self.verify_chain_id().await {
                Ok(()) => {
                    if !was_connected {
                        if let Err(err) = self.connect().await {
                            warn!(?err, "engine handshake failed");
                        }
                    }
                }
                Err(err) => {
                    self.connected.store(false, Ordering::Release);
                    if err.is_unauthorized() {
                        error!(?err, "execution engine rejected jwt credentials");
                    } else if was_connected {
                        warn!(?err, "lost connection to execution engine");
                    }
                }
            }

            let interval = if self.is_connected() {
                self.config.rpc_jwt_refresh_interval
            } else {
                self.config.rpc_startup_check_interval
            };
            tokio::time::sleep(interval).await;
        }
    }

    async fn chain_id(&self) -> Result<u64, EngineError> {
        let chain_id: String = self.rpc.call(ETH_CHAIN_ID, vec![]).await?;
        parse_chain_id(&chain_id)
    }

    /// Confirm the engine serves the chain this network requires.
    pub async fn verify_chain_id(&self) -> Result<(), EngineError> {
        let actual = self.chain_id().await?;
        check_chain_id(self.network_spec.required_chain_id, actual)
    }

    pub async fn exchange_capabilities(&self) -> Result<Vec<String>, EngineError> {
        self.rpc
            .call(ENGINE_EXCHANGE_CAPABILITIES, vec![serde_json::to_value(
                CAPABILITIES,
            )?])
            .await
    }

    /// Compare terminal transition parameters with the engine. Mismatches
    /// are logged rather than fatal, and engines that no longer serve the
    /// method are tolerated.
    pub async fn exchange_transition_configuration(&self) -> Result<(), EngineError> {
        let local = self.network_spec.transition_configuration();
        let remote = self
            .rpc
            .call(ENGINE_EXCHANGE_TRANSITION_CONFIGURATION_V1, vec![
                serde_json::to_value(&local)?,
            ])
            .await;
        reconcile_transition_configuration(&local, remote)
    }

    pub async fn execution_block_by_hash(
        &self,
        block_hash: B256,
    ) -> Result<Option<ExecutionBlock>, EngineError> {
        self.rpc
            .call(ETH_GET_BLOCK_BY_HASH, vec![
                serde_json::to_value(block_hash)?,
                json!(false),
            ])
            .await
    }

    /// Fetch a block header by number, or the latest when `None`.
    pub async fn execution_block_by_number(
        &self,
        block_number: Option<u64>,
    ) -> Result<Option<ExecutionBlock>, EngineError> {
        let tag = match block_number {
            Some(number) => json!(format!("{number:#x}")),
            None => json!("latest"),
        };
        self.rpc
            .call(ETH_GET_BLOCK_BY_NUMBER, vec![tag, json!(false)])
            .await
    }

    /// Fetch several block headers in one JSON-RPC batch, in input order.
    pub async fn execution_blocks_by_hashes(
        &self,
        block_hashes: Vec<B256>,
    ) -> Result<Vec<Option<ExecutionBlock>>, EngineError> {
        if block_hashes.is_empty() {
            return Ok(vec![]);
        }
        let params_list = block_hashes
            .into_iter()
            .map(|hash| Ok(vec![serde_json::to_value(hash)?, json!(false)]))
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        self.rpc.batch_call(ETH_GET_BLOCK_BY_HASH, params_list).await
    }

    /// Fetch payload bodies by hash. Entries the engine does not know come
    /// back as `null` and are normalized to empty bodies.
    pub async fn payload_bodies_by_hash(
        &self,
        block_hashes: Vec<B256>,
    ) -> Result<Vec<ExecutionPayloadBodyV1>, EngineError> {
        let bodies: Vec<Option<ExecutionPayloadBodyV1>> = self
            .rpc
            .call(ENGINE_GET_PAYLOAD_BODIES_BY_HASH_V1, vec![
                serde_json::to_value(block_hashes)?,
            ])
            .await?;
        Ok(normalize_payload_bodies(bodies))
    }

    pub async fn payload_bodies_by_range(
        &self,
        start: u64,
        count: u64,
    ) -> Result<Vec<ExecutionPayloadBodyV1>, EngineError> {
        let bodies: Vec<Option<ExecutionPayloadBodyV1>> = self
            .rpc
            .call(ENGINE_GET_PAYLOAD_BODIES_BY_RANGE_V1, vec![
                json!(format!("{start:#x}")),
                json!(format!("{count:#x}")),
            ])
            .await?;
        Ok(normalize_payload_bodies(bodies))
    }
}

fn parse_chain_id(chain_id: &str) -> Result<u64, EngineError> {
    u64::from_str_radix(auth::strip_prefix(chain_id), 16)
        .map_err(|err| EngineError::Json(format!("invalid chain id {chain_id}: {err}")))
}

fn check_chain_id(expected: u64, actual: u64) -> Result<(), EngineError> {
    if actual != expected {
        return Err(EngineError::ChainIdMismatch { expected, actual });
    }
    Ok(())
}

/// Handle the engine's answer to the transition-configuration exchange. A
/// mismatch is logged rather than fatal, and engines that no longer serve
/// the deprecated method are tolerated.
fn reconcile_transition_configuration(
    local: &TransitionConfiguration,
    remote: Result<TransitionConfiguration, EngineError>,
) -> Result<(), EngineError> {
    let remote = match remote {
        Ok(remote) => remote,
        Err(EngineError::MethodNotFound(_)) => {
            debug!("engine does not serve transition configuration exchange");
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    if remote != *local {
        warn!(
            ?local,
            ?remote,
            "transition configuration differs from execution engine"
        );
    }
    Ok(())
}

/// Engines answer `null` for payload bodies they do not know; those entries
/// become empty bodies so callers see one body per requested block.
fn normalize_payload_bodies(
    bodies: Vec<Option<ExecutionPayloadBodyV1>>,
) -> Vec<ExecutionPayloadBodyV1> {
    bodies.into_iter().map(Option::unwrap_or_default).collect()
}

#[async_trait]
impl EngineApi for EngineClient {
    async fn new_payload(
        &self,
        payload: ExecutionPayload,
        versioned_hashes: Vec<B256>,
        parent_beacon_block_root: B256,
    ) -> Result<Option<B256>, EngineError> {
        let status: PayloadStatusV1 = match &payload {
            ExecutionPayload::Capella(_) => {
                self.rpc
                    .call(ENGINE_NEW_PAYLOAD_V2, vec![serde_json::to_value(&payload)?])
                    .await?
            }
            ExecutionPayload::Deneb(_) => {
                self.rpc
                    .call(ENGINE_NEW_PAYLOAD_V3, vec![
                        serde_json::to_value(&payload)?,
                        serde_json::to_value(&versioned_hashes)?,
                        serde_json::to_value(parent_beacon_block_root)?,
                    ])
                    .await?
            }
        };
        process_payload_status(status)
    }

    async fn forkchoice_updated(
        &self,
        state: ForkchoiceState,
        payload_attributes: Option<PayloadAttributes>,
    ) -> Result<(Option<PayloadId>, Option<B256>), EngineError> {
        // Callers must always supply a fork-versioned attributes container,
        // even for head-only updates. Rejected before any RPC is made.
        let attributes = payload_attributes.ok_or(EngineError::NilPayloadAttributes)?;

        let method = match attributes.version() {
            ForkVersion::Capella => ENGINE_FORKCHOICE_UPDATED_V2,
            ForkVersion::Deneb => ENGINE_FORKCHOICE_UPDATED_V3,
        };
        let response: ForkchoiceUpdatedResponse = self
            .rpc
            .call(method, vec![
                serde_json::to_value(state)?,
                attributes.to_wire_value()?,
            ])
            .await?;

        if let Some(status) = &response.payload_status {
            inc_counter_vec(&FORKCHOICE_STATUS, &[status.status.as_str()]);
        }
        process_forkchoice_response(response)
    }

    async fn get_payload(
        &self,
        payload_id: PayloadId,
        fork: ForkVersion,
    ) -> Result<BuiltPayload, EngineError> {
        let params = vec![serde_json::to_value(payload_id)?];
        match fork {
            ForkVersion::Capella => {
                let response: GetPayloadV2Response =
                    self.rpc.call(ENGINE_GET_PAYLOAD_V2, params).await?;
                Ok(response.into())
            }
            ForkVersion::Deneb => {
                let response: GetPayloadV3Response =
                    self.rpc.call(ENGINE_GET_PAYLOAD_V3, params).await?;
                Ok(response.into())
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Map a `engine_newPayload` status to the caller-facing result.
pub fn process_payload_status(status: PayloadStatusV1) -> Result<Option<B256>, EngineError> {
    match status.status {
        PayloadStatus::Valid => Ok(status.latest_valid_hash),
        PayloadStatus::Invalid => Err(EngineError::InvalidPayloadStatus {
            latest_valid_hash: status.latest_valid_hash,
        }),
        PayloadStatus::Accepted | PayloadStatus::Syncing => Err(EngineError::AcceptedSyncing),
        PayloadStatus::InvalidBlockHash => Err(EngineError::InvalidBlockHashStatus),
        PayloadStatus::Unknown => Err(EngineError::UnknownPayloadStatus),
    }
}

/// Map a `engine_forkchoiceUpdated` response to the caller-facing result.
/// ACCEPTED is a success here: the engine took the head optimistically and
/// may still hand back a payload ID.
pub fn process_forkchoice_response(
    response: ForkchoiceUpdatedResponse,
) -> Result<(Option<PayloadId>, Option<B256>), EngineError> {
    let Some(status) = response.payload_status else {
        return Err(EngineError::NilPayloadStatus);
    };
    match status.status {
        PayloadStatus::Valid | PayloadStatus::Accepted => {
            Ok((response.payload_id, status.latest_valid_hash))
        }
        PayloadStatus::Syncing => Err(EngineError::AcceptedSyncing),
        PayloadStatus::Invalid => Err(EngineError::InvalidPayloadStatus {
            latest_valid_hash: status.latest_valid_hash,
        }),
        PayloadStatus::InvalidBlockHash => Err(EngineError::InvalidBlockHashStatus),
        PayloadStatus::Unknown => Err(EngineError::UnknownPayloadStatus),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy_primitives::{B64, Bytes, b256};
    use keel_network_spec::networks::DEV;
    use rstest::rstest;
    use url::Url;

    use super::*;

    fn unreachable_client() -> EngineClient {
        let url = Url::parse("http://127.0.0.1:0").expect("static url must parse");
        EngineClient {
            rpc: RpcClient::new(
                url,
                JwtSigner::from_secret(&[0u8; 32]),
                Duration::from_millis(10),
            ),
            config: EngineConfig::default(),
            network_spec: DEV.clone(),
            connected: AtomicBool::new(false),
        }
    }

    #[tokio::test]
    async fn nil_attributes_are_rejected_before_any_rpc() {
        let client = unreachable_client();
        // The dial target is unreachable, so anything but the static error
        // would surface as a transport failure.
        let result = client
            .forkchoice_updated(ForkchoiceState::default(), None)
            .await;
        assert_eq!(result, Err(EngineError::NilPayloadAttributes));
    }

    #[tokio::test]
    async fn failed_handshake_leaves_the_client_disconnected() {
        let client = unreachable_client();
        assert!(client.connect().await.is_err());
        assert!(!client.is_connected());
    }

    #[test]
    fn parses_hex_chain_ids() {
        assert_eq!(parse_chain_id("0x138d7"), Ok(80087));
        assert_eq!(parse_chain_id("138d7"), Ok(80087));
        assert!(matches!(parse_chain_id("0xnope"), Err(EngineError::Json(_))));
    }

    #[test]
    fn chain_id_mismatch_is_fatal() {
        assert_eq!(check_chain_id(80087, 80087), Ok(()));
        assert_eq!(
            check_chain_id(80087, 1),
            Err(EngineError::ChainIdMismatch {
                expected: 80087,
                actual: 1,
            })
        );
    }

    #[test]
    fn transition_configuration_exchange_tolerates_a_missing_method() {
        let local = DEV.transition_configuration();
        assert_eq!(
            reconcile_transition_configuration(
                &local,
                Err(EngineError::MethodNotFound("gone".to_string()))
            ),
            Ok(())
        );
    }

    #[test]
    fn transition_configuration_mismatch_is_not_fatal() {
        let local = DEV.transition_configuration();
        let remote = TransitionConfiguration {
            terminal_block_number: 7,
            ..local.clone()
        };
        assert_eq!(reconcile_transition_configuration(&local, Ok(remote)), Ok(()));
        // Transport failures still surface.
        assert_eq!(
            reconcile_transition_configuration(&local, Err(EngineError::Timeout)),
            Err(EngineError::Timeout)
        );
    }

    #[test]
    fn unknown_payload_bodies_normalize_to_empty() {
        let known = ExecutionPayloadBodyV1 {
            transactions: vec![Bytes::from_static(&[0xca, 0xfe])],
            withdrawals: Some(vec![]),
        };
        let normalized =
            normalize_payload_bodies(vec![Some(known.clone()), None, Some(known.clone())]);
        assert_eq!(normalized, vec![
            known.clone(),
            ExecutionPayloadBodyV1::default(),
            known,
        ]);
    }

    fn status(status: PayloadStatus, latest_valid_hash: Option<B256>) -> PayloadStatusV1 {
        PayloadStatusV1 {
            status,
            latest_valid_hash,
            validation_error: None,
        }
    }

    const LATEST: B256 =
        b256!("0x1111111111111111111111111111111111111111111111111111111111111111");
    const PAYLOAD_ID: Option<PayloadId> = Some(B64::new([1, 2, 3, 4, 5, 6, 7, 8]));

    #[rstest]
    #[case::valid(status(PayloadStatus::Valid, Some(LATEST)), Ok(Some(LATEST)))]
    #[case::invalid(
        status(PayloadStatus::Invalid, Some(LATEST)),
        Err(EngineError::InvalidPayloadStatus { latest_valid_hash: Some(LATEST) })
    )]
    #[case::accepted(status(PayloadStatus::Accepted, None), Err(EngineError::AcceptedSyncing))]
    #[case::syncing(status(PayloadStatus::Syncing, None), Err(EngineError::AcceptedSyncing))]
    #[case::invalid_block_hash(
        status(PayloadStatus::InvalidBlockHash, None),
        Err(EngineError::InvalidBlockHashStatus)
    )]
    #[case::unknown(status(PayloadStatus::Unknown, None), Err(EngineError::UnknownPayloadStatus))]
    #[case::unset(PayloadStatusV1::default(), Err(EngineError::UnknownPayloadStatus))]
    fn new_payload_status_mapping(
        #[case] input: PayloadStatusV1,
        #[case] expected: Result<Option<B256>, EngineError>,
    ) {
        assert_eq!(process_payload_status(input), expected);
    }

    // VALID and ACCEPTED both succeed and surface the payload ID.
    #[rstest]
    #[case::valid(
        Some(status(PayloadStatus::Valid, Some(LATEST))),
        PAYLOAD_ID,
        Ok((PAYLOAD_ID, Some(LATEST)))
    )]
    #[case::accepted(
        Some(status(PayloadStatus::Accepted, None)),
        PAYLOAD_ID,
        Ok((PAYLOAD_ID, None))
    )]
    #[case::syncing(
        Some(status(PayloadStatus::Syncing, None)),
        None,
        Err(EngineError::AcceptedSyncing)
    )]
    #[case::invalid(
        Some(status(PayloadStatus::Invalid, Some(LATEST))),
        None,
        Err(EngineError::InvalidPayloadStatus { latest_valid_hash: Some(LATEST) })
    )]
    #[case::invalid_block_hash(
        Some(status(PayloadStatus::InvalidBlockHash, None)),
        None,
        Err(EngineError::InvalidBlockHashStatus)
    )]
    #[case::unknown(
        Some(status(PayloadStatus::Unknown, None)),
        None,
        Err(EngineError::UnknownPayloadStatus)
    )]
    #[case::unset(None, PAYLOAD_ID, Err(EngineError::NilPayloadStatus))]
    fn forkchoice_response_mapping(
        #[case] payload_status: Option<PayloadStatusV1>,
        #[case] payload_id: Option<PayloadId>,
        #[case] expected: Result<(Option<PayloadId>, Option<B256>), EngineError>,
    ) {
        assert_eq!(
            process_forkchoice_response(ForkchoiceUpdatedResponse {
                payload_status,
                payload_id,
            }),
            expected
        );
    }
}
