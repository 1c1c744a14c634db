//! Rollcall CLI - Command-line attendance client
//!
//! Drives windows, flags, attendance attempts, and tuning for each role.

mod backend;
mod cli;
mod commands;
mod errors;
mod output;
mod output_types;
mod progress;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new()?;
    let json = cli.json;

    if let Err(e) = runtime.block_on(commands::execute(cli)) {
        let error = errors::from_anyhow(e);
        if json {
            output::OutputWriter::new(true).error(&error);
        } else {
            error.display();
        }
        std::process::exit(1);
    }

    Ok(())
}
