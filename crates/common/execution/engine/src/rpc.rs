use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use keel_metrics::{
    ENGINE_API_REQUEST_TIME,
    helpers::{start_timer_vec, stop_timer},
};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::{auth::JwtSigner, errors::EngineError};

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub id: u64,
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

/// Authenticated JSON-RPC transport for the engine endpoint. Every call is
/// bounded by the configured timeout and signed with a fresh JWT.
pub struct RpcClient {
    http_client: Client,
    url: Url,
    jwt_signer: JwtSigner,
    timeout: Duration,
    request_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: Url, jwt_signer: JwtSigner, timeout: Duration) -> RpcClient {
        RpcClient {
            http_client: Client::new(),
            url,
            jwt_signer,
            timeout,
            request_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Vec<Value>,
    ) -> Result<T, EngineError> {
        let request = JsonRpcRequest {
            id: self.next_id(),
            jsonrpc: "2.0",
            method,
            params,
        };

        let timer = start_timer_vec(&ENGINE_API_REQUEST_TIME, &[method]);
        let response = tokio::time::timeout(self.timeout, self.dispatch(&request)).await;
        stop_timer(timer);

        match response {
            Ok(response) => Self::unpack(response?),
            Err(_) => Err(EngineError::Timeout),
        }
    }

    /// Issue one JSON-RPC batch for `params_list`, preserving input order in
    /// the output even when the engine answers out of order.
    pub async fn batch_call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params_list: Vec<Vec<Value>>,
    ) -> Result<Vec<T>, EngineError> {
        let requests = params_list
            .into_iter()
            .map(|params| JsonRpcRequest {
                id: self.next_id(),
                jsonrpc: "2.0",
                method,
                params,
            })
            .collect::<Vec<_>>();

        let timer = start_timer_vec(&ENGINE_API_REQUEST_TIME, &[method]);
        let response = tokio::time::timeout(self.timeout, self.dispatch_batch(&requests)).await;
        stop_timer(timer);

        let mut responses = match response {
            Ok(responses) => responses?,
            Err(_) => return Err(EngineError::Timeout),
        };
        responses.sort_by_key(|response| response.id);

        responses.into_iter().map(Self::unpack).collect()
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, EngineError> {
        let response = self
            .http_client
            .post(self.url.clone())
            .json(request)
            .bearer_auth(self.jwt_signer.create_token()?)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(EngineError::Unauthorized);
        }
        Ok(response.json::<JsonRpcResponse>().await?)
    }

    async fn dispatch_batch(
        &self,
        requests: &[JsonRpcRequest],
    ) -> Result<Vec<JsonRpcResponse>, EngineError> {
        let response = self
            .http_client
            .post(self.url.clone())
            .json(requests)
            .bearer_auth(self.jwt_signer.create_token()?)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(EngineError::Unauthorized);
        }
        Ok(response.json::<Vec<JsonRpcResponse>>().await?)
    }

    fn unpack<T: DeserializeOwned>(response: JsonRpcResponse) -> Result<T, EngineError> {
        if let Some(error) = response.error {
            return Err(EngineError::from_rpc_error(error.code, error.message));
        }
        Ok(serde_json::from_value(
            response.result.unwrap_or(Value::Null),
        )?)
    }
}
