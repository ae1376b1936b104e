//! Noise Feature Pipeline - Main Entry Point

use anyhow::Result;
use clap::Parser;
use feature_cli::{cli::Cli, init_logging, run};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs)?;

    debug!("noise-features v{}", env!("CARGO_PKG_VERSION"));
    run(cli)
}
