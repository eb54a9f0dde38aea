use std::{path::PathBuf, time::Duration};

use alloy_primitives::Address;
use url::Url;

pub const DEFAULT_RPC_DIAL_URL: &str = "http://localhost:8551";
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_millis(900);
pub const DEFAULT_RPC_STARTUP_CHECK_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_RPC_JWT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Connection settings for the execution client's authenticated engine
/// endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub rpc_dial_url: Url,
    /// Per-call deadline for engine API requests.
    pub rpc_timeout: Duration,
    /// How often to re-dial the engine while it is unreachable.
    pub rpc_startup_check_interval: Duration,
    /// How often the connection monitor re-verifies the chain ID once
    /// connected.
    pub rpc_jwt_refresh_interval: Duration,
    pub jwt_secret_path: PathBuf,
    /// Fee recipient used for locally built payloads.
    pub suggested_fee_recipient: Address,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            rpc_dial_url: Url::parse(DEFAULT_RPC_DIAL_URL)
                .expect("default engine dial url must parse"),
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            rpc_startup_check_interval: DEFAULT_RPC_STARTUP_CHECK_INTERVAL,
            rpc_jwt_refresh_interval: DEFAULT_RPC_JWT_REFRESH_INTERVAL,
            jwt_secret_path: PathBuf::from("./jwt.hex"),
            suggested_fee_recipient: Address::ZERO,
        }
    }
}
