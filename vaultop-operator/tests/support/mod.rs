//! Shared helpers for resource tests: an in-memory vault and throwaway
//! PGP keyrings for encrypted shares.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pgp::composed::{KeyType, SecretKeyParamsBuilder, SubkeyParamsBuilder};
use pgp::crypto::ecc_curve::ECCCurve;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::ser::Serialize;
use pgp::types::SecretKeyTrait;
use pgp::{Message, SignedPublicKey, SignedSecretKey};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use vaultop_client::{ClientError, ClientResult, InitRequest, InitResponse, SealStatus, VaultOperations};

pub const ADDRESS: &str = "http://127.0.0.1:8200";

/// Shares accepted by [`MockVault::with_shares`].
pub const VALID_SHARES: [&str; 5] = ["share-0", "share-1", "share-2", "share-3", "share-4"];

#[derive(Default)]
struct MockState {
    sealed: bool,
    initialized: bool,
    accepted: Vec<String>,
    unseal_calls: Vec<String>,
    init_calls: usize,
}

/// In-memory vault: any `threshold` distinct valid shares unseal it, an
/// unknown share is rejected with a 400.
pub struct MockVault {
    valid: Vec<String>,
    threshold: u32,
    init_response: InitResponse,
    state: Mutex<MockState>,
}

impl MockVault {
    pub fn with_shares(threshold: u32) -> Self {
        Self {
            valid: VALID_SHARES.iter().map(|s| s.to_string()).collect(),
            threshold,
            init_response: InitResponse::default(),
            state: Mutex::new(MockState {
                sealed: true,
                ..Default::default()
            }),
        }
    }

    pub fn with_init_response(mut self, response: InitResponse) -> Self {
        self.init_response = response;
        self
    }

    pub fn already_initialized(self) -> Self {
        self.state.lock().unwrap().initialized = true;
        self
    }

    pub fn init_calls(&self) -> usize {
        self.state.lock().unwrap().init_calls
    }

    pub fn unseal_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().unseal_calls.clone()
    }

    pub fn is_sealed(&self) -> bool {
        self.state.lock().unwrap().sealed
    }

    fn status(&self, state: &MockState) -> SealStatus {
        SealStatus {
            seal_type: "shamir".into(),
            initialized: true,
            sealed: state.sealed,
            threshold: self.threshold,
            shares: self.valid.len() as u32,
            progress: if state.sealed { state.accepted.len() as u32 } else { 0 },
            ..Default::default()
        }
    }
}

#[async_trait]
impl VaultOperations for MockVault {
    fn address(&self) -> &str {
        ADDRESS
    }

    async fn initialize(&self, _request: &InitRequest) -> ClientResult<InitResponse> {
        let mut state = self.state.lock().unwrap();
        state.init_calls += 1;
        if state.initialized {
            return Err(ClientError::Api {
                status: 400,
                message: "Vault is already initialized".into(),
            });
        }
        state.initialized = true;
        Ok(self.init_response.clone())
    }

    async fn unseal(&self, key: &str) -> ClientResult<SealStatus> {
        let mut state = self.state.lock().unwrap();
        state.unseal_calls.push(key.to_string());

        if !self.valid.iter().any(|v| v == key) {
            return Err(ClientError::Api {
                status: 400,
                message: "invalid key".into(),
            });
        }
        if state.sealed && !state.accepted.iter().any(|a| a == key) {
            state.accepted.push(key.to_string());
            if state.accepted.len() as u32 >= self.threshold {
                state.sealed = false;
                state.accepted.clear();
            }
        }
        Ok(self.status(&state))
    }

    async fn seal_status(&self) -> ClientResult<SealStatus> {
        let state = self.state.lock().unwrap();
        Ok(self.status(&state))
    }
}

/// Ed25519 primary + Curve25519 encryption subkey, both protected by `passphrase`.
pub fn generate_keypair(passphrase: &str) -> (SignedSecretKey, SignedPublicKey) {
    let mut rng = rand::thread_rng();
    let params = SecretKeyParamsBuilder::default()
        .key_type(KeyType::EdDSALegacy)
        .can_certify(true)
        .can_sign(true)
        .primary_user_id("Share Holder <holder@example.com>".into())
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

/// Encrypts `plaintext` the way Vault encrypts shares for `pgp_keys`.
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

pub fn write_keyring(dir: &Path, name: &str, secret: &SignedSecretKey) -> PathBuf {
    let path = dir.join(name);
    let armored = secret
        .to_armored_string(Default::default())
        .expect("armor must succeed");
    std::fs::write(&path, armored).expect("keyring write");
    path
}
