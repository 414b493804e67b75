use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(&cli);
    commands::run_command(cli).await
}

/// `RUST_LOG` wins; otherwise `--verbose` means debug, and a node logs at info.
fn init_tracing(cli: &cli::Cli) {
    let default = if cli.verbose {
        "debug"
    } else if matches!(cli.command, cli::Command::Serve(_)) {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
