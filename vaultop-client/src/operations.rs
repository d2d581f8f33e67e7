//! The operations the unseal and init flows need from a Vault server.

use crate::error::ClientResult;
use crate::types::{InitRequest, InitResponse, SealStatus};
use async_trait::async_trait;

#[async_trait]
pub trait VaultOperations: Send + Sync {
    /// Address the operations are issued against. Used as the identity of
    /// the captured init record.
    fn address(&self) -> &str;

    /// Initializes the vault. Fails if it is already initialized.
    async fn initialize(&self, request: &InitRequest) -> ClientResult<InitResponse>;

    /// Submits a single unseal key share.
    async fn unseal(&self, key: &str) -> ClientResult<SealStatus>;

    async fn seal_status(&self) -> ClientResult<SealStatus>;
}
