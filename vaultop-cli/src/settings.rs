//! TOML settings file.
//!
//! ```toml
//! [provider]
//! vault_addr = "https://vault.internal:8200"
//! request_headers = { "X-Vault-Namespace" = "ops" }
//!
//! [init]
//! secret_shares = 5
//! secret_threshold = 3
//!
//! [unseal]
//! keys = ["...", "...", "...", "...", "..."]
//! pgp_keys = ["/etc/vaultop/holder-0.asc", ...]
//! passphrase = ["...", ...]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use vaultop_client::ClientConfig;
use vaultop_operator::{InitConfig, UnsealArgs};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub provider: ClientConfig,
    pub init: InitConfig,
    pub unseal: UnsealArgs,
}

impl Settings {
    /// `vaultop/config.toml` under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vaultop").join("config.toml"))
    }

    /// Loads `path`, or the default file if it exists, or built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vaultop_crypto::SelectionStrategy;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.provider.address, "");
        assert_eq!(settings.provider.timeout_secs, 30);
        assert_eq!(settings.init, InitConfig::default());
        assert_eq!(settings.unseal.secret_shares, 5);
        assert_eq!(settings.unseal.secret_threshold, 3);
        assert_eq!(settings.unseal.strategy, SelectionStrategy::Random);
    }

    #[test]
    fn full_file() {
        let settings = Settings::parse(
            r#"
            [provider]
            vault_addr = "https://vault.internal:8200"
            timeout_secs = 10
            request_headers = { "X-Vault-Namespace" = "ops" }

            [init]
            secret_shares = 3
            secret_threshold = 2
            recovery_shares = 1
            recovery_threshold = 1

            [unseal]
            secret_shares = 3
            secret_threshold = 2
            keys = ["a", "b", "c"]
            pgp_keys = ["/k/0.asc", "/k/1.asc", "/k/2.asc"]
            passphrase = ["p0", "p1", "p2"]
            strategy = "first_threshold"
            "#,
        )
        .unwrap();

        assert_eq!(settings.provider.address, "https://vault.internal:8200");
        assert_eq!(settings.provider.timeout_secs, 10);
        assert_eq!(
            settings.provider.request_headers.get("X-Vault-Namespace"),
            Some(&"ops".to_string())
        );
        assert_eq!(settings.init.secret_shares, 3);
        assert_eq!(settings.init.recovery_shares, 1);
        assert_eq!(settings.unseal.keys, vec!["a", "b", "c"]);
        assert_eq!(settings.unseal.pgp_keys[2], PathBuf::from("/k/2.asc"));
        assert_eq!(settings.unseal.strategy, SelectionStrategy::FirstThreshold);
    }

    #[test]
    fn unknown_table_rejected() {
        assert!(Settings::parse("[server]\nport = 1").is_err());
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[init]\nsecret_shares = 1\nsecret_threshold = 1\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.init.secret_shares, 1);
    }
}
