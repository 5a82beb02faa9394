//! archsearch - Main Entry Point
//!
//! Runs random, NSGA-II or hybrid architecture search from the command line.

use clap::Parser;
use archsearch::cli::{cmd_hybrid, cmd_nsga2, cmd_random, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archsearch=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Random(args) => cmd_random(&args)?,
        Commands::Nsga2(args) => cmd_nsga2(&args)?,
        Commands::Hybrid(args) => cmd_hybrid(&args)?,
    }

    Ok(())
}
