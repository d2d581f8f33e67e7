//! Vault initialization and capture of its one-time output.
//!
//! `sys/init` is the only time Vault hands out the root token and the
//! unseal key shares, so the response is persisted verbatim. A record saved
//! elsewhere (for example by `vault operator init -format=json`) can be
//! imported instead of initializing again.

use crate::error::{OperatorError, OperatorResult};
use crate::state::StateStore;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use vaultop_client::{InitRequest, InitResponse, VaultOperations};

/// State record name for the init resource.
pub const INIT_STATE: &str = "init";

/// Parameters for `sys/init`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    /// Number of shares the root key is split into.
    pub secret_shares: u32,
    /// Shares required to reconstruct the root key.
    pub secret_threshold: u32,
    /// Shares stored in the seal device (auto-unseal only).
    pub stored_shares: Option<u32>,
    pub recovery_shares: u32,
    pub recovery_threshold: u32,
    /// Base64 public keys, one per share, used to encrypt the returned shares.
    pub pgp_keys: Vec<String>,
    /// Base64 public keys, one per recovery share.
    pub recovery_pgp_keys: Vec<String>,
    /// Base64 public key used to encrypt the returned root token.
    pub root_token_pgp_key: Option<String>,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            secret_shares: 5,
            secret_threshold: 3,
            stored_shares: None,
            recovery_shares: 0,
            recovery_threshold: 0,
            pgp_keys: Vec::new(),
            recovery_pgp_keys: Vec::new(),
            root_token_pgp_key: None,
        }
    }
}

impl InitConfig {
    /// Rejects inconsistent share counts before anything is sent to Vault.
    pub fn validate(&self) -> OperatorResult<()> {
        if self.secret_threshold == 0 || self.secret_threshold > self.secret_shares {
            return Err(OperatorError::Config(format!(
                "secret_threshold must be between 1 and secret_shares ({}), got {}",
                self.secret_shares, self.secret_threshold
            )));
        }
        if self.recovery_threshold > self.recovery_shares {
            return Err(OperatorError::Config(format!(
                "recovery_threshold ({}) exceeds recovery_shares ({})",
                self.recovery_threshold, self.recovery_shares
            )));
        }
        if !self.pgp_keys.is_empty() && self.pgp_keys.len() != self.secret_shares as usize {
            return Err(OperatorError::Config(format!(
                "pgp_keys has {} entries, expected one per secret share ({})",
                self.pgp_keys.len(),
                self.secret_shares
            )));
        }
        if !self.recovery_pgp_keys.is_empty()
            && self.recovery_pgp_keys.len() != self.recovery_shares as usize
        {
            return Err(OperatorError::Config(format!(
                "recovery_pgp_keys has {} entries, expected one per recovery share ({})",
                self.recovery_pgp_keys.len(),
                self.recovery_shares
            )));
        }
        Ok(())
    }

    fn to_request(&self) -> InitRequest {
        InitRequest {
            secret_shares: self.secret_shares,
            secret_threshold: self.secret_threshold,
            stored_shares: self.stored_shares,
            recovery_shares: self.recovery_shares,
            recovery_threshold: self.recovery_threshold,
            pgp_keys: self.pgp_keys.clone(),
            recovery_pgp_keys: self.recovery_pgp_keys.clone(),
            root_token_pgp_key: self.root_token_pgp_key.clone(),
        }
    }
}

/// The persisted output of an initialization.
///
/// Serializes with the same field names as the `sys/init` response, so a
/// saved record can itself be imported.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializationResult {
    /// Address of the vault this record belongs to.
    pub id: String,
    pub root_token: String,
    pub keys: Vec<String>,
    pub keys_base64: Vec<String>,
    pub recovery_keys: Vec<String>,
    pub recovery_keys_base64: Vec<String>,
    /// Source file when the record was imported rather than created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_from: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InitializationResult {
    fn from_response(id: &str, response: InitResponse, imported_from: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            root_token: response.root_token,
            keys: response.keys,
            keys_base64: response.keys_base64,
            recovery_keys: response.recovery_keys,
            recovery_keys_base64: response.recovery_keys_base64,
            imported_from,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializationResult")
            .field("id", &self.id)
            .field("root_token", &"<redacted>")
            .field("keys", &self.keys.len())
            .field("keys_base64", &self.keys_base64.len())
            .field("recovery_keys", &self.recovery_keys.len())
            .field("recovery_keys_base64", &self.recovery_keys_base64.len())
            .field("imported_from", &self.imported_from)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Resolves a `file:` import identifier to a local path.
///
/// The host part is kept as a leading path component, so both
/// `file:///etc/vault/init.json` and `file://backups/init.json` work.
pub fn resolve_import_path(id: &str) -> OperatorResult<PathBuf> {
    let url = Url::parse(id).map_err(|e| OperatorError::InvalidImportId {
        id: id.to_string(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "file" {
        return Err(OperatorError::UnsupportedScheme {
            id: id.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {
            let path =
                urlencoding::decode(url.path()).map_err(|e| OperatorError::InvalidImportId {
                    id: id.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(PathBuf::from(host).join(path.trim_start_matches('/')))
        }
        _ => url.to_file_path().map_err(|()| OperatorError::InvalidImportId {
            id: id.to_string(),
            reason: "not a local file path".to_string(),
        }),
    }
}

/// The init resource: creates or imports the record, then treats it as
/// immutable.
pub struct InitResource<'a> {
    ops: &'a dyn VaultOperations,
    store: &'a StateStore,
}

impl<'a> InitResource<'a> {
    pub fn new(ops: &'a dyn VaultOperations, store: &'a StateStore) -> Self {
        Self { ops, store }
    }

    /// Initializes the vault and persists the result.
    ///
    /// Refuses to run while a record is stored, so the only copy of a root
    /// token is never replaced. An already initialized vault is an error from
    /// Vault itself; nothing is retried.
    pub async fn create(&self, config: &InitConfig) -> OperatorResult<InitializationResult> {
        config.validate()?;
        self.ensure_vacant()?;

        let response = self.ops.initialize(&config.to_request()).await?;
        let result = InitializationResult::from_response(self.ops.address(), response, None);
        self.store.save(INIT_STATE, &result)?;

        info!(
            id = %result.id,
            keys = result.keys.len(),
            recovery_keys = result.recovery_keys.len(),
            "vault initialized"
        );
        Ok(result)
    }

    /// Imports a saved init record from a `file:` URL without contacting Vault.
    pub async fn import(&self, id: &str) -> OperatorResult<InitializationResult> {
        let path = resolve_import_path(id)?;
        self.ensure_vacant()?;
        let json = fs::read_to_string(&path).map_err(|source| OperatorError::Import {
            path: path.display().to_string(),
            source,
        })?;
        let response: InitResponse = serde_json::from_str(&json)?;

        let result = InitializationResult::from_response(
            self.ops.address(),
            response,
            Some(path.display().to_string()),
        );
        self.store.save(INIT_STATE, &result)?;

        info!(
            id = %result.id,
            path = %path.display(),
            keys = result.keys.len(),
            "imported init record"
        );
        Ok(result)
    }

    fn ensure_vacant(&self) -> OperatorResult<()> {
        if self.store.exists(INIT_STATE) {
            return Err(OperatorError::AlreadyExists {
                path: self.store.path(INIT_STATE).display().to_string(),
            });
        }
        Ok(())
    }

    /// Returns the stored record; Vault is not consulted.
    pub fn read(&self) -> OperatorResult<Option<InitializationResult>> {
        self.store.load(INIT_STATE)
    }

    /// Initialization cannot be redone, so this only returns the stored record.
    pub fn update(&self, _config: &InitConfig) -> OperatorResult<Option<InitializationResult>> {
        self.read()
    }

    /// Forgets the record locally. The vault stays initialized.
    pub fn delete(&self) -> OperatorResult<()> {
        self.store.clear(INIT_STATE)
    }
}
