//! Plaintext key share wrapper.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A plaintext unseal key share.
///
/// The buffer is wiped when the share is dropped, and `Debug` output is
/// redacted so shares can sit inside logged structures safely.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretShare(String);

impl SecretShare {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the share for handing to the unseal endpoint.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretShare(<redacted>)")
    }
}

impl From<String> for SecretShare {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretShare {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
