//! Random string generation backed by the random.org JSON-RPC API

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub const DEFAULT_RANDOM_API_URL: &str = "https://api.random.org/json-rpc/4/invoke";

const STRING_LENGTH: u32 = 10;
const CHARACTERS: &str = "abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Error)]
pub enum RandomStringError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("random.org API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("random.org response did not contain a string")]
    EmptyResponse,
}

/// Source of the strings returned by the `random_string` operation
#[async_trait]
pub trait RandomStringProvider: Send + Sync {
    async fn generate(&self) -> Result<String, RandomStringError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<RpcResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcResult {
    random: RandomData,
}

#[derive(Debug, Deserialize)]
struct RandomData {
    #[serde(default)]
    data: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Clone)]
pub struct RandomOrgClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl RandomOrgClient {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }

    fn request_body(&self) -> serde_json::Value {
        json!({
            "jsonrpc": "2.0",
            "method": "generateStrings",
            "params": {
                "apiKey": self.api_key,
                "n": 1,
                "length": STRING_LENGTH,
                "characters": CHARACTERS,
                "replacement": true
            },
            "id": 42
        })
    }
}

#[async_trait]
impl RandomStringProvider for RandomOrgClient {
    async fn generate(&self) -> Result<String, RandomStringError> {
        tracing::debug!("Requesting random string from {}", self.api_url);

        let response: RpcResponse = self
            .client
            .post(&self.api_url)
            .json(&self.request_body())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        extract_string(response)
    }
}

fn extract_string(response: RpcResponse) -> Result<String, RandomStringError> {
    if let Some(error) = response.error {
        return Err(RandomStringError::Api {
            code: error.code,
            message: error.message,
        });
    }

    response
        .result
        .and_then(|result| result.random.data.into_iter().next())
        .ok_or(RandomStringError::EmptyResponse)
}
