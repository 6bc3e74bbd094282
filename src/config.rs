//! Runtime configuration read from the environment
//!
//! # Environment Variables
//!
//! * `DATABASE_URL` - Database connection string (required)
//! * `BIND_ADDR` - Listen address (default: 0.0.0.0:3000)
//! * `TOKEN_LIFETIME_SECS` - API token lifetime in seconds (default: 86400)
//! * `RANDOM_API_KEY` - random.org API key
//! * `RANDOM_V4_API_URL` - random.org JSON-RPC endpoint

use std::env;
use thiserror::Error;

use crate::services::auth::DEFAULT_TOKEN_LIFETIME_SECS;
use crate::services::random_string::DEFAULT_RANDOM_API_URL;

const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_BIND_ADDR: &str = "BIND_ADDR";
const ENV_TOKEN_LIFETIME: &str = "TOKEN_LIFETIME_SECS";
const ENV_RANDOM_API_KEY: &str = "RANDOM_API_KEY";
const ENV_RANDOM_API_URL: &str = "RANDOM_V4_API_URL";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub token_lifetime_secs: i64,
    pub random_api_key: Option<String>,
    pub random_api_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get(ENV_DATABASE_URL).ok_or(ConfigError::Missing(ENV_DATABASE_URL))?;

        let token_lifetime_secs = match get(ENV_TOKEN_LIFETIME) {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    name: ENV_TOKEN_LIFETIME,
                    value: raw,
                })?,
            None => DEFAULT_TOKEN_LIFETIME_SECS,
        };

        Ok(Self {
            database_url,
            bind_addr: get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            token_lifetime_secs,
            random_api_key: get(ENV_RANDOM_API_KEY),
            random_api_url: get(ENV_RANDOM_API_URL)
                .unwrap_or_else(|| DEFAULT_RANDOM_API_URL.to_string()),
        })
    }

    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_lifetime_secs)
    }
}
