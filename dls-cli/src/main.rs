// dls: batch analyzer entry point

use anyhow::Result;
use clap::Parser;
use dls_cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Analyze { verbose, quiet, .. } => {
            if *quiet {
                "error"
            } else if *verbose {
                "debug"
            } else {
                "info"
            }
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = dls_cli::run(cli)?;
    std::process::exit(exit_code);
}
