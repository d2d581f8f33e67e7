//! Vault HTTP client for vaultop.
//!
//! Only the unauthenticated bootstrap endpoints are covered:
//! - `PUT /v1/sys/init` to initialize a fresh vault
//! - `PUT /v1/sys/unseal` to submit one key share
//! - `GET /v1/sys/seal-status` to read the seal state
//!
//! [`VaultOperations`] is the seam the operator layer programs against, so
//! the unseal and init flows can run against a mock in tests.

pub mod api_client;
pub mod config;
pub mod error;
pub mod operations;
pub mod types;

pub use api_client::VaultClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use operations::VaultOperations;
pub use types::*;
