use std::path::Path;

use alloy_primitives::hex;
use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// issued-at claim. Represented as seconds passed since UNIX_EPOCH.
    iat: u64,
    /// Optional unique identifier for the CL node.
    id: Option<String>,
    /// Optional client version for the CL node.
    clv: Option<String>,
}

/// HS256 signer for the engine endpoint's JWT handshake. Tokens are minted
/// per request so the `iat` claim always falls inside the engine's drift
/// window.
pub struct JwtSigner {
    encoding_key: EncodingKey,
}

impl JwtSigner {
    /// Load the shared hex-encoded secret from disk. A leading `0x` and
    /// trailing whitespace are tolerated.
    pub fn from_file(path: &Path) -> anyhow::Result<JwtSigner> {
        let jwt_file = std::fs::read_to_string(path)?;
        let jwt_private_key = hex::decode(strip_prefix(jwt_file.trim_end()))?;
        Ok(JwtSigner {
            encoding_key: EncodingKey::from_secret(jwt_private_key.as_slice()),
        })
    }

    pub fn from_secret(secret: &[u8]) -> JwtSigner {
        JwtSigner {
            encoding_key: EncodingKey::from_secret(secret),
        }
    }

    pub fn create_token(&self) -> Result<String, EngineError> {
        let claims = Claims {
            iat: get_current_timestamp(),
            id: None,
            clv: None,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| EngineError::Http(format!("could not encode jwt token: {err:?}")))
    }
}

pub fn strip_prefix(s: &str) -> &str {
    if let Some(stripped) = s.strip_prefix("0x") {
        stripped
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hex_prefix() {
        assert_eq!(strip_prefix("0xdeadbeef"), "deadbeef");
        assert_eq!(strip_prefix("deadbeef"), "deadbeef");
    }
}
