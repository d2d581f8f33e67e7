//! Share handling for vaultop.
//!
//! Covers the two pieces of the unseal path that do real work before any
//! request reaches the vault:
//! - Picking which `threshold`-sized subset of the configured key shares to
//!   present, uniformly over all C(n, m) subsets
//! - Decrypting PGP-encrypted key shares with a local private keyring
//!
//! Plaintext shares are carried as [`SecretShare`], which zeroizes its
//! buffer on drop and never prints its contents.

pub mod combination;
mod error;
pub mod decrypt;
mod share;

pub use combination::{
    combination_count, select_combination, Combination, Combinations, FixedIndices, IndexSource,
    RngSource, SelectionStrategy,
};
pub use error::{CryptoError, CryptoResult};
pub use decrypt::decrypt_share;
pub use share::SecretShare;
