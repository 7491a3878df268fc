//! Switch Web API Client
//!
//! Transport for the JSON management API of TP-Link managed switches.
//!
//! # Architecture
//!
//! - **Connection**: HTTPS `POST` to `/data/<endpoint>.json` with a JSON body
//! - **Authentication**: `login.json` returns a transaction id (`_tid_`) and a
//!   permission level (`usrLvl`) that every later call echoes as query parameters
//! - **TLS**: switches ship self-signed certificates, so verification is off unless
//!   `verify_ssl` is set
//!
//! One [`SwitchClient`] is built at startup and shared read-only by every device
//! session; `reqwest` pools the connections underneath.
//!
//! # Example
//!
//! ```no_run
//! use tplink_exporter::config::SwitchConfig;
//! use tplink_exporter::switch::SwitchClient;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = SwitchConfig {
//!     devices: vec!["switch1.lan".to_string()],
//!     ..Default::default()
//! };
//! let client = SwitchClient::new(&config)?;
//! # Ok(())
//! # }
//! ```

use crate::config::SwitchConfig;
use crate::error::{ExporterError, Result};
use crate::switch::record::SessionToken;
use crate::switch::types::ApiResponse;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Client for the switch web API
///
/// Holds no per-device state. Session tokens are passed in by the caller.
#[derive(Debug, Clone)]
pub struct SwitchClient {
    http: reqwest::Client,
    scheme: &'static str,
}

impl SwitchClient {
    pub fn new(config: &SwitchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(config.max_idle_connections);

        if config.use_tls && !config.verify_ssl {
            // Custom TLS connector for self-signed certs
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| ExporterError::Config(e.to_string()))?;
            builder = builder.use_preconfigured_tls(connector);
        }

        Ok(Self {
            http: builder.build()?,
            scheme: if config.use_tls { "https" } else { "http" },
        })
    }

    /// URL of a management endpoint on `host`, e.g. `https://sw1/data/port.json`
    pub fn endpoint_url(&self, host: &str, endpoint: &str) -> String {
        format!("{}://{}/data/{}", self.scheme, host, endpoint)
    }

    /// POST `body` to an endpoint and decode the raw response envelope
    ///
    /// HTTP error statuses and undecodable bodies are errors; the envelope's own
    /// `success` flag is left for the caller to judge.
    pub async fn call<T>(
        &self,
        host: &str,
        endpoint: &str,
        token: Option<&SessionToken>,
        body: &serde_json::Value,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(host, endpoint);
        let mut request = self.http.post(&url).json(body);

        if let Some(token) = token {
            let level = token.permission_level.to_string();
            request = request.query(&[
                ("_tid_", token.transaction_id.as_str()),
                ("usrLvl", level.as_str()),
            ]);
        }

        debug!("POST {}", url);
        let response = request.send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!("{} response received ({} bytes)", endpoint, bytes.len());

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Authenticated call returning the envelope payload
    pub async fn fetch<T>(
        &self,
        host: &str,
        endpoint: &str,
        token: &SessionToken,
        body: &serde_json::Value,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.call::<T>(host, endpoint, Some(token), body)
            .await?
            .into_data(endpoint)
    }
}
