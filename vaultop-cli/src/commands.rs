use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use vaultop_client::{ClientConfig, VaultClient};
use vaultop_crypto::{RngSource, SelectionStrategy};
use vaultop_operator::init::INIT_STATE;
use vaultop_operator::unseal::UNSEAL_STATE;
use vaultop_operator::{
    read_seal_status, InitResource, InitializationResult, StateStore, UnsealConfig, UnsealRecord,
    UnsealResource,
};

use crate::cli::{Cli, Command, ResourceArg};
use crate::settings::Settings;

pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let store = StateStore::new(cli.state_dir.clone().unwrap_or_else(StateStore::default_dir));

    match cli.command {
        Command::Init => {
            let client = client(&cli.vault_addr, settings.provider)?;
            let result = InitResource::new(&client, &store)
                .create(&settings.init)
                .await?;
            print_json(&init_view(Some(&result), false)?)?;
        }
        Command::Import { id } => {
            let client = client(&cli.vault_addr, settings.provider)?;
            let result = InitResource::new(&client, &store).import(&id).await?;
            print_json(&init_view(Some(&result), false)?)?;
        }
        Command::Unseal { first_threshold } => {
            let mut args = settings.unseal;
            if first_threshold {
                args.strategy = SelectionStrategy::FirstThreshold;
            }
            let config = UnsealConfig::new(args)?;
            let client = client(&cli.vault_addr, settings.provider)?;
            let record = UnsealResource::new(&client, &store)
                .create(&config, &mut RngSource::from_entropy())
                .await?;
            print_json(&record)?;
        }
        Command::Status => {
            let client = client(&cli.vault_addr, settings.provider)?;
            let report = read_seal_status(&client).await?;
            print_json(&report)?;
        }
        Command::Show { reveal } => {
            // Local state only; no address is needed.
            let init: Option<InitializationResult> = store.load(INIT_STATE)?;
            if init.is_none() {
                info!(dir = %store.dir().display(), "no init record");
            }
            print_json(&init_view(init.as_ref(), reveal)?)?;
            if let Some(record) = store.load::<UnsealRecord>(UNSEAL_STATE)? {
                print_json(&record)?;
            }
        }
        Command::Destroy { resource } => {
            if matches!(resource, ResourceArg::Init | ResourceArg::All) {
                store.clear(INIT_STATE)?;
            }
            if matches!(resource, ResourceArg::Unseal | ResourceArg::All) {
                store.clear(UNSEAL_STATE)?;
            }
            info!(dir = %store.dir().display(), ?resource, "removed local state");
        }
    }
    Ok(())
}

fn client(vault_addr: &Option<String>, mut config: ClientConfig) -> Result<VaultClient> {
    if let Some(addr) = vault_addr {
        config.address = addr.clone();
    }
    let config = config.resolve()?;
    VaultClient::new(config).context("failed to build Vault client")
}

/// One line for stderr, with the full context chain.
pub fn error_line(error: &anyhow::Error) -> String {
    format!("error: {error:#}")
}

/// Init records are shown as counts unless `reveal` is set. A missing record
/// is `null`.
fn init_view(result: Option<&InitializationResult>, reveal: bool) -> Result<serde_json::Value> {
    let Some(result) = result else {
        return Ok(serde_json::Value::Null);
    };
    if reveal {
        return Ok(serde_json::to_value(result)?);
    }

    #[derive(Serialize)]
    struct Summary<'a> {
        id: &'a str,
        keys: usize,
        recovery_keys: usize,
        root_token: &'a str,
        imported_from: Option<&'a str>,
        created_at: String,
    }

    Ok(serde_json::to_value(Summary {
        id: &result.id,
        keys: result.keys.len(),
        recovery_keys: result.recovery_keys.len(),
        root_token: "<redacted, use --reveal>",
        imported_from: result.imported_from.as_deref(),
        created_at: result.created_at.to_rfc3339(),
    })?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
