use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

const CLI_AFTER_HELP: &str = r#"Examples:
  vaultop --vault-addr http://127.0.0.1:8200 init
  vaultop import file:///var/backups/vault-init.json
  vaultop unseal
  vaultop status

Configuration:
  Settings are read from --config, or from vaultop/config.toml in the user
  config directory when present. VAULT_ADDR is used when no address is set.
"#;

/// Top-level command line parser.
#[derive(Debug, Parser)]
#[command(
    name = "vaultop",
    version,
    about = "Initialize and unseal HashiCorp Vault, keeping the init output as local state.",
    after_help = CLI_AFTER_HELP,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Settings file (TOML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory for resource state.
    /// Default: `vaultop` under the platform data directory.
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,
    /// Vault address; overrides the settings file and VAULT_ADDR.
    #[arg(long, global = true)]
    pub vault_addr: Option<String>,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize the vault and store the root token and key shares.
    Init,
    /// Store a saved init record instead of initializing.
    Import {
        /// `file://` URL of a JSON init response.
        id: String,
    },
    /// Unseal the vault with the configured key shares.
    Unseal {
        /// Always use the first `secret_threshold` shares.
        #[arg(long)]
        first_threshold: bool,
    },
    /// Print the vault's seal status.
    Status,
    /// Print the stored records.
    Show {
        /// Include root token and key shares.
        #[arg(long)]
        reveal: bool,
    },
    /// Forget stored records. The vault itself is not touched.
    Destroy {
        #[arg(long, value_enum, default_value_t = ResourceArg::All)]
        resource: ResourceArg,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResourceArg {
    Init,
    Unseal,
    All,
}
