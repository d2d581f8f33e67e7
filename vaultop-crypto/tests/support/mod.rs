//! Shared helpers for share decryption tests: throwaway OpenPGP keypairs
//! and share encryption the way a vault does it for `pgp_keys`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pgp::composed::{KeyType, SecretKeyParamsBuilder, SubkeyParamsBuilder};
use pgp::crypto::ecc_curve::ECCCurve;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::ser::Serialize;
use pgp::types::SecretKeyTrait;
use pgp::{Message, SignedPublicKey, SignedSecretKey};
use std::path::{Path, PathBuf};

/// Ed25519 primary + Curve25519 encryption subkey, both protected by `passphrase`.
pub fn generate_keypair(passphrase: &str) -> (SignedSecretKey, SignedPublicKey) {
    let mut rng = rand::thread_rng();
    let params = SecretKeyParamsBuilder::default()
        .key_type(KeyType::EdDSALegacy)
        .can_certify(true)
        .can_sign(true)
        .primary_user_id("Unseal Holder <holder@example.com>".into())
        .passphrase(Some(passphrase.into()))
        .subkey(
            SubkeyParamsBuilder::default()
                .key_type(KeyType::ECDH(ECCCurve::Curve25519))
                .can_encrypt(true)
                .passphrase(Some(passphrase.into()))
                .build()
                .expect("subkey params"),
        )
        .build()
        .expect("key params");

    let secret = params
        .generate(&mut rng)
        .expect("key generation")
        .sign(&mut rng, || passphrase.to_string())
        .expect("self-signature");
    let public = secret
        .public_key()
        .sign(&mut rng, &secret, || passphrase.to_string())
        .expect("public key signature");

    (secret, public)
}

/// Encrypts `plaintext` to the keypair's encryption subkey, base64-encoded.
pub fn encrypt_share(public: &SignedPublicKey, plaintext: &str) -> String {
    let mut rng = rand::thread_rng();
    let encrypted = Message::new_literal("share", plaintext)
        .encrypt_to_keys_seipdv1(
            &mut rng,
            SymmetricKeyAlgorithm::AES128,
            &[&public.public_subkeys[0]],
        )
        .expect("encryption must succeed");
    STANDARD.encode(encrypted.to_bytes().expect("serialization must succeed"))
}

/// Writes the secret key as an ASCII-armored keyring file.
pub fn write_armored_keyring(dir: &Path, name: &str, secret: &SignedSecretKey) -> PathBuf {
    let path = dir.join(name);
    let armored = secret
        .to_armored_string(Default::default())
        .expect("armor must succeed");
    std::fs::write(&path, armored).expect("keyring write");
    path
}

/// Writes the secret key as a binary keyring file.
pub fn write_binary_keyring(dir: &Path, name: &str, secret: &SignedSecretKey) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, secret.to_bytes().expect("serialization must succeed"))
        .expect("keyring write");
    path
}
