//! Vault client configuration.

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environment variable consulted when no address is configured.
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";

/// Configuration for [`crate::VaultClient`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Vault instance URL (e.g., "https://vault.internal:8200").
    /// Empty means "use `VAULT_ADDR`".
    #[serde(alias = "vault_addr")]
    pub address: String,

    /// Extra headers sent with every request.
    pub request_headers: BTreeMap<String, String>,

    /// Per-request timeout in seconds. Zero disables the timeout.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            request_headers: BTreeMap::new(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Fills the address from `VAULT_ADDR` when unset and validates it.
    pub fn resolve(self) -> ClientResult<Self> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Like [`Self::resolve`], with an explicit environment lookup.
    pub fn resolve_with(mut self, env: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        if self.address.trim().is_empty() {
            self.address = env(VAULT_ADDR_ENV).unwrap_or_default();
        }
        self.address = self.address.trim().trim_end_matches('/').to_string();

        if self.address.is_empty() {
            return Err(ClientError::Config(format!(
                "argument 'vault_addr' is required, or set {VAULT_ADDR_ENV} environment variable"
            )));
        }
        if !self.address.starts_with("http://") && !self.address.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "vault address must be an http(s) URL, got '{}'",
                self.address
            )));
        }
        Ok(self)
    }
}
