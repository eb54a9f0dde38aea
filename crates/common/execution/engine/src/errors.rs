use alloy_primitives::B256;

/// Error codes defined by the engine API and JSON-RPC specifications.
pub const PARSE_ERROR_CODE: i64 = -32700;
pub const INVALID_REQUEST_CODE: i64 = -32600;
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;
pub const INVALID_PARAMS_CODE: i64 = -32602;
pub const INTERNAL_ERROR_CODE: i64 = -32603;
pub const SERVER_ERROR_CODE: i64 = -32000;
pub const UNKNOWN_PAYLOAD_CODE: i64 = -38001;
pub const INVALID_FORKCHOICE_STATE_CODE: i64 = -38002;
pub const INVALID_PAYLOAD_ATTRIBUTES_CODE: i64 = -38003;
pub const REQUEST_TOO_LARGE_CODE: i64 = -38004;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine request timed out")]
    Timeout,

    #[error("engine rejected the JWT credentials")]
    Unauthorized,

    #[error("http transport failure: {0}")]
    Http(String),

    #[error("failed to encode or decode engine JSON: {0}")]
    Json(String),

    #[error("engine parse error: {0}")]
    Parse(String),

    #[error("engine rejected the request as malformed: {0}")]
    InvalidRequest(String),

    #[error("engine does not support the method: {0}")]
    MethodNotFound(String),

    #[error("engine rejected the request params: {0}")]
    InvalidParams(String),

    #[error("engine internal error: {0}")]
    Internal(String),

    #[error("engine server error: {0}")]
    Server(String),

    #[error("engine does not know the payload: {0}")]
    UnknownPayload(String),

    #[error("invalid forkchoice state: {0}")]
    InvalidForkchoiceState(String),

    #[error("invalid payload attributes: {0}")]
    InvalidPayloadAttributes(String),

    #[error("engine request too large: {0}")]
    RequestTooLarge(String),

    #[error("engine returned unexpected error code {code}: {message}")]
    UnexpectedErrorCode { code: i64, message: String },

    #[error("engine returned an empty result where one was required")]
    NilResult,

    #[error("engine deemed the payload invalid")]
    InvalidPayloadStatus { latest_valid_hash: Option<B256> },

    #[error("engine deemed the payload's block hash invalid")]
    InvalidBlockHashStatus,

    /// The payload was accepted optimistically or the engine is still
    /// syncing. Callers may treat this as non-fatal.
    #[error("payload accepted while engine is syncing or lacks ancestors")]
    AcceptedSyncing,

    #[error("engine returned an unrecognized payload status")]
    UnknownPayloadStatus,

    #[error("engine returned a forkchoice response without a payload status")]
    NilPayloadStatus,

    #[error("no payload attributes were supplied for the forkchoice update")]
    NilPayloadAttributes,

    #[error("engine reports chain id {actual} but this network requires {expected}")]
    ChainIdMismatch { expected: u64, actual: u64 },
}

impl EngineError {
    /// Map a JSON-RPC error object returned by the engine to a typed error.
    pub fn from_rpc_error(code: i64, message: String) -> EngineError {
        match code {
            PARSE_ERROR_CODE => EngineError::Parse(message),
            INVALID_REQUEST_CODE => EngineError::InvalidRequest(message),
            METHOD_NOT_FOUND_CODE => EngineError::MethodNotFound(message),
            INVALID_PARAMS_CODE => EngineError::InvalidParams(message),
            INTERNAL_ERROR_CODE => EngineError::Internal(message),
            SERVER_ERROR_CODE => EngineError::Server(message),
            UNKNOWN_PAYLOAD_CODE => EngineError::UnknownPayload(message),
            INVALID_FORKCHOICE_STATE_CODE => EngineError::InvalidForkchoiceState(message),
            INVALID_PAYLOAD_ATTRIBUTES_CODE => EngineError::InvalidPayloadAttributes(message),
            REQUEST_TOO_LARGE_CODE => EngineError::RequestTooLarge(message),
            code => EngineError::UnexpectedErrorCode { code, message },
        }
    }

    /// Whether this error means the payload was taken optimistically rather
    /// than rejected. Block receipt continues past these.
    pub fn is_accepted_syncing(&self) -> bool {
        matches!(self, EngineError::AcceptedSyncing)
    }

    /// Whether the engine's credentials were rejected. Logged on every
    /// occurrence by the connection monitor, not just on state changes.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EngineError::Unauthorized)
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return EngineError::Timeout;
        }
        if let Some(status) = error.status()
            && status == reqwest::StatusCode::UNAUTHORIZED
        {
            return EngineError::Unauthorized;
        }
        if error.is_decode() {
            return EngineError::Json(error.to_string());
        }
        EngineError::Http(error.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::Json(error.to_string())
    }
}
