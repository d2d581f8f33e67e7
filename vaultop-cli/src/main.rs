mod cli;
mod commands;
mod settings;

use clap::Parser;

use cli::Cli;

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(error) = commands::run(cli).await {
        eprintln!("{}", commands::error_line(&error));
        std::process::exit(1);
    }
}
