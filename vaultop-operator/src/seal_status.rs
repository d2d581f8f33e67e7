//! Read-only view of the vault's seal state.

use crate::error::OperatorResult;
use crate::unseal::SealState;
use serde::Serialize;
use tracing::debug;
use vaultop_client::{SealStatus, VaultOperations};

/// Identity of the seal status data source.
pub const SEAL_STATUS_ID: &str = "seal_status";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SealStatusReport {
    pub id: String,
    pub sealed: bool,
    pub state: SealState,
    pub status: SealStatus,
}

/// Reads `sys/seal-status`.
pub async fn read_seal_status(ops: &dyn VaultOperations) -> OperatorResult<SealStatusReport> {
    let status = ops.seal_status().await?;
    let state = SealState::from(&status);
    debug!(%state, initialized = status.initialized, "read seal status");

    Ok(SealStatusReport {
        id: SEAL_STATUS_ID.to_string(),
        sealed: status.sealed,
        state,
        status,
    })
}
