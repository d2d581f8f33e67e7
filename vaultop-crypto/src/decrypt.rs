//! OpenPGP decryption of encrypted key shares.
//!
//! When a vault is initialized with `pgp_keys`, every unseal key it returns
//! is encrypted to the matching public key and base64-encoded. To use such a
//! share, the holder's private keyring is read from disk, unlocked with the
//! holder's passphrase, and used to open the message.

use crate::error::{CryptoError, CryptoResult};
use crate::share::SecretShare;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pgp::types::SecretKeyTrait;
use pgp::{Deserializable, Message, SignedSecretKey};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Decrypts one base64-encoded, PGP-encrypted key share.
///
/// The first key found in the keyring at `keyring_path` is used. Its primary
/// key and every secret subkey must unlock with `passphrase`; a wrong
/// passphrase fails here rather than during message decryption.
pub fn decrypt_share(
    keyring_path: impl AsRef<Path>,
    passphrase: &str,
    cipher_base64: &str,
) -> CryptoResult<SecretShare> {
    let keyring_path = keyring_path.as_ref();
    let key = read_first_key(keyring_path)?;
    unlock(&key, passphrase)?;

    let ciphertext = STANDARD.decode(cipher_base64.trim())?;
    let message =
        Message::from_bytes(ciphertext.as_slice()).map_err(|e| CryptoError::Decrypt(e.to_string()))?;

    let (decrypted, recipients) = message
        .decrypt(|| passphrase.to_string(), &[&key])
        .map_err(|e| CryptoError::Decrypt(e.to_string()))?;
    debug!(
        keyring = %keyring_path.display(),
        recipients = recipients.len(),
        "decrypted share session key"
    );

    let body = decrypted
        .get_content()
        .map_err(|e| CryptoError::Decrypt(e.to_string()))?
        .ok_or_else(|| CryptoError::Decrypt("message has no literal data".into()))?;

    String::from_utf8(body)
        .map(SecretShare::from)
        .map_err(|_| CryptoError::Encoding)
}

/// Reads the keyring (armored or binary) and returns its first key.
fn read_first_key(path: &Path) -> CryptoResult<SignedSecretKey> {
    let bytes = fs::read(path).map_err(|source| CryptoError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(CryptoError::EmptyKeyring(path.display().to_string()));
    }

    let (mut keys, _headers) = SignedSecretKey::from_reader_many(bytes.as_slice())
        .map_err(|e| CryptoError::Keyring(e.to_string()))?;

    match keys.next() {
        Some(Ok(key)) => Ok(key),
        Some(Err(e)) => Err(CryptoError::Keyring(e.to_string())),
        None => Err(CryptoError::EmptyKeyring(path.display().to_string())),
    }
}

fn unlock(key: &SignedSecretKey, passphrase: &str) -> CryptoResult<()> {
    key.unlock(|| passphrase.to_string(), |_| Ok(()))
        .map_err(|e| CryptoError::Unlock(e.to_string()))?;

    for subkey in &key.secret_subkeys {
        subkey
            .unlock(|| passphrase.to_string(), |_| Ok(()))
            .map_err(|e| CryptoError::Unlock(e.to_string()))?;
    }
    Ok(())
}
