//! Error types for share selection and decryption.

use thiserror::Error;

/// Result type for share operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised while selecting or decrypting key shares.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid threshold: need 0 < threshold <= shares, got threshold {threshold} of {shares} shares")]
    InvalidThreshold { shares: usize, threshold: usize },

    #[error("too many share combinations to enumerate: C({shares}, {threshold}) overflows")]
    CombinationOverflow { shares: usize, threshold: usize },

    #[error("failed to read keyring {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("keyring {0} contains no keys")]
    EmptyKeyring(String),

    #[error("failed to parse keyring: {0}")]
    Keyring(String),

    #[error("failed to unlock private key: {0}")]
    Unlock(String),

    #[error("invalid base64 share: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to decrypt share: {0}")]
    Decrypt(String),

    #[error("decrypted share is not valid UTF-8")]
    Encoding,
}
