//! Error types for the vaultop resources.

use crate::unseal::UnsealFailure;
use std::io;
use thiserror::Error;
use vaultop_client::ClientError;
use vaultop_crypto::CryptoError;

/// Result type for resource operations.
pub type OperatorResult<T> = Result<T, OperatorError>;

/// Errors surfaced by the init, unseal and seal status resources.
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid import identifier '{id}': {reason}")]
    InvalidImportId { id: String, reason: String },

    #[error("unsupported import scheme '{scheme}' in '{id}', expected a file:// URL")]
    UnsupportedScheme { id: String, scheme: String },

    #[error("failed to read import file {path}: {source}")]
    Import {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("an init record already exists at {path}; destroy it before creating or importing another")]
    AlreadyExists { path: String },

    #[error("state storage error at {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Unseal(#[from] UnsealFailure),
}
