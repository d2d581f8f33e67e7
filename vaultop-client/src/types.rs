//! Request and response bodies for the Vault bootstrap endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Treats an explicit JSON `null` like a missing field.
///
/// Vault serializes empty key lists as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `PUT /v1/sys/init`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    pub secret_shares: u32,
    pub secret_threshold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_shares: Option<u32>,
    #[serde(default)]
    pub recovery_shares: u32,
    #[serde(default)]
    pub recovery_threshold: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pgp_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recovery_pgp_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_token_pgp_key: Option<String>,
}

/// Response of `PUT /v1/sys/init`, and the shape of a saved init record.
///
/// Every field is sensitive; `Debug` prints only counts.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub keys: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keys_base64: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recovery_keys: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recovery_keys_base64: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub root_token: String,
}

impl fmt::Debug for InitResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitResponse")
            .field("keys", &self.keys.len())
            .field("keys_base64", &self.keys_base64.len())
            .field("recovery_keys", &self.recovery_keys.len())
            .field("recovery_keys_base64", &self.recovery_keys_base64.len())
            .field("root_token", &"<redacted>")
            .finish()
    }
}

/// Body of `PUT /v1/sys/unseal`.
#[derive(Serialize)]
pub(crate) struct UnsealRequest<'a> {
    pub key: &'a str,
}

/// Seal state as reported by `sys/unseal` and `sys/seal-status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealStatus {
    #[serde(default, rename = "type")]
    pub seal_type: String,
    #[serde(default)]
    pub initialized: bool,
    pub sealed: bool,
    /// Number of shares required to unseal.
    #[serde(default, rename = "t")]
    pub threshold: u32,
    /// Total number of shares.
    #[serde(default, rename = "n")]
    pub shares: u32,
    /// Shares accepted so far in the current unseal attempt.
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub version: String,
}

/// Vault's error envelope: `{"errors": ["..."]}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn init_response_accepts_null_lists() {
        let json = r#"{"keys":["k1"],"keys_base64":["a1"],"recovery_keys":null,"recovery_keys_base64":null,"root_token":"rt"}"#;
        let resp: InitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.keys, vec!["k1"]);
        assert!(resp.recovery_keys.is_empty());
        assert_eq!(resp.root_token, "rt");
    }

    #[test]
    fn init_response_debug_hides_secrets() {
        let resp = InitResponse {
            keys: vec!["super-secret-key".into()],
            root_token: "s.root".into(),
            ..Default::default()
        };
        let printed = format!("{resp:?}");
        assert!(!printed.contains("super-secret-key"));
        assert!(!printed.contains("s.root"));
    }

    #[test]
    fn init_request_omits_unset_optionals() {
        let req = InitRequest {
            secret_shares: 5,
            secret_threshold: 3,
            ..Default::default()
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["secret_shares"], 5);
        assert!(value.get("pgp_keys").is_none());
        assert!(value.get("root_token_pgp_key").is_none());
        assert!(value.get("stored_shares").is_none());
    }

    #[test]
    fn seal_status_field_names() {
        let json = r#"{"type":"shamir","initialized":true,"sealed":true,"t":3,"n":5,"progress":1,"nonce":"abc","version":"1.15.0"}"#;
        let status: SealStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.seal_type, "shamir");
        assert_eq!(status.threshold, 3);
        assert_eq!(status.shares, 5);
        assert_eq!(status.progress, 1);
    }
}
