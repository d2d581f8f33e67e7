//! HTTP client for the Vault bootstrap endpoints.
//!
//! These endpoints are unauthenticated, so no token handling is needed.
//! Non-2xx responses are turned into [`ClientError::Api`] carrying Vault's
//! own error messages.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::operations::VaultOperations;
use crate::types::{ErrorBody, InitRequest, InitResponse, SealStatus, UnsealRequest};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Vault API client for init, unseal and seal status.
#[derive(Clone, Debug)]
pub struct VaultClient {
    client: Client,
    config: ClientConfig,
}

impl VaultClient {
    /// Builds a client for `config`.
    ///
    /// The address is used as given; call [`ClientConfig::resolve`] first to
    /// honour `VAULT_ADDR`.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let config = config.resolve_with(|_| None)?;
        let mut builder = Client::builder()
            .user_agent(format!("vaultop/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(Self::header_map(&config)?);
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    fn header_map(config: &ClientConfig) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.request_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::Config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Config(format!("invalid value for header '{name}': {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.address, path)
    }

    /// Decodes a success body, or maps Vault's error envelope.
    async fn parse<T: DeserializeOwned>(path: &str, resp: Response) -> ClientResult<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
            _ if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            _ => body.trim().to_string(),
        };

        warn!(path, status = status.as_u16(), %message, "Vault request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl VaultOperations for VaultClient {
    fn address(&self) -> &str {
        &self.config.address
    }

    async fn initialize(&self, request: &InitRequest) -> ClientResult<InitResponse> {
        debug!(
            secret_shares = request.secret_shares,
            secret_threshold = request.secret_threshold,
            recovery_shares = request.recovery_shares,
            recovery_threshold = request.recovery_threshold,
            pgp_keys = request.pgp_keys.len(),
            "PUT sys/init"
        );
        let resp = self.client.put(self.url("sys/init")).json(request).send().await?;
        let init: InitResponse = Self::parse("sys/init", resp).await?;
        debug!(response = ?init, "sys/init succeeded");
        Ok(init)
    }

    async fn unseal(&self, key: &str) -> ClientResult<SealStatus> {
        let resp = self
            .client
            .put(self.url("sys/unseal"))
            .json(&UnsealRequest { key })
            .send()
            .await?;
        let status: SealStatus = Self::parse("sys/unseal", resp).await?;
        debug!(
            sealed = status.sealed,
            progress = status.progress,
            threshold = status.threshold,
            "sys/unseal response"
        );
        Ok(status)
    }

    async fn seal_status(&self) -> ClientResult<SealStatus> {
        let resp = self.client.get(self.url("sys/seal-status")).send().await?;
        let status: SealStatus = Self::parse("sys/seal-status", resp).await?;
        debug!(response = ?status, "sys/seal-status response");
        Ok(status)
    }
}
