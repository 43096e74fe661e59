//! Gantry CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gantry_cli::cli::{Cli, dispatch_command};

/// Install the stderr logger. An explicit level flag wins over `RUST_LOG`.
fn init_logging(cli: &Cli) {
    let explicit = cli.trace || cli.verbose || cli.log_level.is_some();
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !explicit => EnvFilter::new(directives),
        _ => EnvFilter::new(cli.log_level().as_filter_str()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    dispatch_command(cli)
}
