//! Vault bootstrap resources for vaultop.
//!
//! Three resources sit on top of [`vaultop_client::VaultOperations`]:
//! - [`InitResource`] initializes a vault (or imports a saved init record)
//!   and keeps the one-time root token and key shares as local state
//! - [`UnsealResource`] picks a quorum of shares, decrypts them if they are
//!   PGP-protected and feeds them to the vault one at a time
//! - [`read_seal_status`] reports whether the vault is currently sealed
//!
//! Local state lives in a [`StateStore`], one JSON file per resource.

mod error;
pub mod init;
pub mod seal_status;
pub mod state;
pub mod unseal;

pub use error::{OperatorError, OperatorResult};
pub use init::{resolve_import_path, InitConfig, InitResource, InitializationResult};
pub use seal_status::{read_seal_status, SealStatusReport, SEAL_STATUS_ID};
pub use state::StateStore;
pub use unseal::{
    Keyring, SealState, UnsealArgs, UnsealConfig, UnsealFailure, UnsealOutcome, UnsealRecord,
    UnsealResource, UnsealSequencer, UNSEAL_ID,
};
