//! Unsealing a vault from a configured set of key shares.
//!
//! One attempt:
//! 1. validate the share list and PGP material ([`UnsealConfig::new`])
//! 2. read the current seal state; an unsealed vault ends the attempt
//! 3. pick `secret_threshold` of the `secret_shares` shares
//! 4. decrypt only the picked shares, if they are PGP-protected
//! 5. submit them one by one ([`UnsealSequencer`]) until Vault reports
//!    unsealed or rejects a share
//!
//! Shares already accepted by Vault stay accepted when a later one fails;
//! there is no retry and no rollback.

use crate::error::{OperatorError, OperatorResult};
use crate::state::StateStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};
use vaultop_client::{ClientError, SealStatus, VaultOperations};
use vaultop_crypto::{
    decrypt_share, select_combination, Combination, IndexSource, SecretShare, SelectionStrategy,
};
use zeroize::Zeroizing;

/// Identity recorded for a completed unseal.
pub const UNSEAL_ID: &str = "create_unseal";

/// State record name for the unseal resource.
pub const UNSEAL_STATE: &str = "unseal";

/// Unseal settings as written by the user, before validation.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsealArgs {
    pub secret_shares: usize,
    pub secret_threshold: usize,
    /// Key shares, plaintext or PGP-encrypted (base64).
    pub keys: Vec<String>,
    /// Private keyring per share, when `keys` are PGP-encrypted.
    pub pgp_keys: Vec<PathBuf>,
    /// Passphrase per keyring in `pgp_keys`.
    pub passphrase: Vec<String>,
    pub strategy: SelectionStrategy,
}

impl Default for UnsealArgs {
    fn default() -> Self {
        Self {
            secret_shares: 5,
            secret_threshold: 3,
            keys: Vec::new(),
            pgp_keys: Vec::new(),
            passphrase: Vec::new(),
            strategy: SelectionStrategy::default(),
        }
    }
}

impl fmt::Debug for UnsealArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsealArgs")
            .field("secret_shares", &self.secret_shares)
            .field("secret_threshold", &self.secret_threshold)
            .field("keys", &self.keys.len())
            .field("pgp_keys", &self.pgp_keys)
            .field("passphrase", &self.passphrase.len())
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Private keyring used to decrypt one share.
#[derive(Clone)]
pub struct Keyring {
    pub path: PathBuf,
    passphrase: Zeroizing<String>,
}

impl Keyring {
    pub fn new(path: impl Into<PathBuf>, passphrase: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("path", &self.path)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Validated unseal settings.
#[derive(Clone, Debug)]
pub struct UnsealConfig {
    secret_shares: usize,
    secret_threshold: usize,
    keys: Vec<SecretShare>,
    keyrings: Option<Vec<Keyring>>,
    strategy: SelectionStrategy,
}

impl UnsealConfig {
    /// Checks counts and list lengths; no file or network I/O happens here.
    pub fn new(args: UnsealArgs) -> OperatorResult<Self> {
        let UnsealArgs {
            secret_shares,
            secret_threshold,
            keys,
            pgp_keys,
            passphrase,
            strategy,
        } = args;

        if secret_threshold == 0 || secret_threshold > secret_shares {
            return Err(OperatorError::Config(format!(
                "secret_threshold must be between 1 and secret_shares ({secret_shares}), got {secret_threshold}"
            )));
        }
        if keys.len() != secret_shares {
            return Err(OperatorError::Config(format!(
                "keys has {} entries, expected secret_shares ({secret_shares})",
                keys.len()
            )));
        }
        if pgp_keys.len() != passphrase.len() {
            return Err(OperatorError::Config(format!(
                "pgp_keys has {} entries but passphrase has {}",
                pgp_keys.len(),
                passphrase.len()
            )));
        }

        let keyrings = if pgp_keys.is_empty() {
            None
        } else if pgp_keys.len() != keys.len() {
            return Err(OperatorError::Config(format!(
                "pgp_keys has {} entries, expected one per key ({})",
                pgp_keys.len(),
                keys.len()
            )));
        } else {
            Some(
                pgp_keys
                    .into_iter()
                    .zip(passphrase)
                    .map(|(path, pass)| Keyring::new(path, pass))
                    .collect(),
            )
        };

        Ok(Self {
            secret_shares,
            secret_threshold,
            keys: keys.into_iter().map(SecretShare::from).collect(),
            keyrings,
            strategy,
        })
    }

    pub fn secret_shares(&self) -> usize {
        self.secret_shares
    }

    pub fn secret_threshold(&self) -> usize {
        self.secret_threshold
    }

    pub fn is_encrypted(&self) -> bool {
        self.keyrings.is_some()
    }

    /// Plaintext shares for `combination`, in combination order.
    fn shares_for(&self, combination: &Combination) -> OperatorResult<Vec<SecretShare>> {
        let mut shares = Vec::with_capacity(combination.len());
        for &i in combination {
            let share = match &self.keyrings {
                Some(keyrings) => {
                    let keyring = &keyrings[i];
                    debug!(share = i, keyring = %keyring.path.display(), "decrypting share");
                    decrypt_share(&keyring.path, &keyring.passphrase, self.keys[i].expose())?
                }
                None => self.keys[i].clone(),
            };
            shares.push(share);
        }
        Ok(shares)
    }
}

/// Seal state as observed after each submitted share.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SealState {
    Sealed,
    PartiallyUnsealed { progress: u32, threshold: u32 },
    Unsealed,
}

impl SealState {
    pub fn is_sealed(&self) -> bool {
        !matches!(self, Self::Unsealed)
    }
}

impl From<&SealStatus> for SealState {
    fn from(status: &SealStatus) -> Self {
        if !status.sealed {
            Self::Unsealed
        } else if status.progress > 0 {
            Self::PartiallyUnsealed {
                progress: status.progress,
                threshold: status.threshold,
            }
        } else {
            Self::Sealed
        }
    }
}

impl fmt::Display for SealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sealed => f.write_str("sealed"),
            Self::PartiallyUnsealed { progress, threshold } => {
                write!(f, "sealed, {progress}/{threshold} shares accepted")
            }
            Self::Unsealed => f.write_str("unsealed"),
        }
    }
}

/// Result of one [`UnsealSequencer::apply_shares`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnsealOutcome {
    pub state: SealState,
    /// Shares Vault accepted during this call.
    pub applied: usize,
}

impl UnsealOutcome {
    pub fn sealed(&self) -> bool {
        self.state.is_sealed()
    }
}

/// A share was rejected, or Vault could not be reached.
#[derive(Debug, Error)]
#[error("unseal failed after {applied} accepted share(s), vault {state}: {source}")]
pub struct UnsealFailure {
    /// Last state Vault reported before the failure.
    pub state: SealState,
    pub applied: usize,
    #[source]
    pub source: ClientError,
}

/// Submits shares to `sys/unseal` in order.
///
/// The sequencer remembers the last reported state across calls. It assumes
/// `Sealed` until [`Self::observe`] or the first accepted share says
/// otherwise.
pub struct UnsealSequencer<'a> {
    ops: &'a dyn VaultOperations,
    state: SealState,
}

impl<'a> UnsealSequencer<'a> {
    pub fn new(ops: &'a dyn VaultOperations) -> Self {
        Self {
            ops,
            state: SealState::Sealed,
        }
    }

    pub fn state(&self) -> SealState {
        self.state
    }

    /// Reads `sys/seal-status`, so progress left by an earlier attempt is
    /// reported if the first share of this one is rejected.
    pub async fn observe(&mut self) -> Result<SealState, ClientError> {
        let status = self.ops.seal_status().await?;
        self.state = SealState::from(&status);
        debug!(state = %self.state, "observed seal state");
        Ok(self.state)
    }

    /// Applies `shares` one at a time, stopping at the first error or as
    /// soon as Vault reports unsealed.
    pub async fn apply_shares(
        &mut self,
        shares: &[SecretShare],
    ) -> Result<UnsealOutcome, UnsealFailure> {
        let mut applied = 0;
        for share in shares {
            match self.ops.unseal(share.expose()).await {
                Ok(status) => {
                    applied += 1;
                    self.state = SealState::from(&status);
                    debug!(applied, state = %self.state, "share accepted");
                    if !self.state.is_sealed() {
                        break;
                    }
                }
                Err(source) => {
                    warn!(applied, state = %self.state, error = %source, "share rejected");
                    return Err(UnsealFailure {
                        state: self.state,
                        applied,
                        source,
                    });
                }
            }
        }

        Ok(UnsealOutcome {
            state: self.state,
            applied,
        })
    }
}

/// Stored record of a completed unseal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsealRecord {
    pub id: String,
    pub sealed: bool,
    /// Share indices that were submitted.
    pub combination: Combination,
    pub applied: usize,
    pub unsealed_at: DateTime<Utc>,
}

/// The unseal resource.
pub struct UnsealResource<'a> {
    ops: &'a dyn VaultOperations,
    store: &'a StateStore,
}

impl<'a> UnsealResource<'a> {
    pub fn new(ops: &'a dyn VaultOperations, store: &'a StateStore) -> Self {
        Self { ops, store }
    }

    /// Runs one unseal attempt and records it as `create_unseal`.
    pub async fn create(
        &self,
        config: &UnsealConfig,
        source: &mut (dyn IndexSource + Send),
    ) -> OperatorResult<UnsealRecord> {
        let mut sequencer = UnsealSequencer::new(self.ops);
        if !sequencer.observe().await?.is_sealed() {
            info!("vault already unsealed, no shares submitted");
            return self.record(Combination::new(), 0, false);
        }

        let combination = select_combination(
            config.secret_shares,
            config.secret_threshold,
            config.strategy,
            source,
        )?;
        let shares = config.shares_for(&combination)?;

        let outcome = sequencer.apply_shares(&shares).await?;
        if outcome.sealed() {
            warn!(state = %outcome.state, "vault still sealed after submitting all selected shares");
        } else {
            info!(applied = outcome.applied, "vault unsealed");
        }

        self.record(combination, outcome.applied, outcome.sealed())
    }

    fn record(
        &self,
        combination: Combination,
        applied: usize,
        sealed: bool,
    ) -> OperatorResult<UnsealRecord> {
        let record = UnsealRecord {
            id: UNSEAL_ID.to_string(),
            sealed,
            combination,
            applied,
            unsealed_at: Utc::now(),
        };
        self.store.save(UNSEAL_STATE, &record)?;
        Ok(record)
    }

    pub fn read(&self) -> OperatorResult<Option<UnsealRecord>> {
        self.store.load(UNSEAL_STATE)
    }

    /// Unsealing is a one-shot action; updates only return the stored record.
    pub fn update(&self) -> OperatorResult<Option<UnsealRecord>> {
        self.read()
    }

    /// Forgets the record. The vault is not resealed.
    pub fn delete(&self) -> OperatorResult<()> {
        self.store.clear(UNSEAL_STATE)
    }
}
