//! Command implementations

mod attend;
mod config;
mod flags;
mod roster;
mod schedule;
mod tune;
mod window;

use crate::backend::{self, AttendanceBackend};
use crate::cli::{Backend, Cli, Commands};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use rollcall_core::config::{CliConfigOverrides, LayeredConfig};
use rollcall_core::models::SessionContext;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "rollcall.toml";

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(
        cli.config.as_deref(),
        CliConfigOverrides {
            server_url: cli.server.clone(),
            request_timeout_secs: cli.timeout,
            ..Default::default()
        },
    )?;
    let session = cli.role.0;

    if let Commands::Config = cli.command {
        return config::execute(&config, &output);
    }

    match cli.backend {
        Backend::Http => {
            run(backend::http(&config)?, cli.command, &session, config, &output).await
        }
        Backend::Memory => {
            output.warning("Using the demo campus; changes last only for this command");
            run(backend::demo_campus()?, cli.command, &session, config, &output).await
        }
    }
}

async fn run<B: AttendanceBackend>(
    service: B,
    command: Commands,
    session: &SessionContext,
    config: LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    tracing::debug!(role = session.role.name(), "Running command");
    match command {
        Commands::Schedule(args) => schedule::execute(args, service, session, &config, output).await,
        Commands::Window(args) => window::execute(args, service, session, &config, output).await,
        Commands::Flags(args) => flags::execute(args, service, session, &config, output).await,
        Commands::Roster(args) => roster::execute(args, service, &config, output).await,
        Commands::Attend(args) => attend::execute(args, service, session, config, output).await,
        Commands::Tune(args) => tune::execute(args, service, session, &config, output).await,
        Commands::Config => config::execute(&config, output),
    }
}

/// Layered configuration: defaults, then file, then environment, then flags.
///
/// Without `--config`, `./rollcall.toml` is read when it exists.
pub fn load_config(path: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let file = match path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    };

    let mut config = LayeredConfig::with_defaults();
    if let Some(file) = file {
        config = config
            .load_from_file(&file)
            .with_context(|| format!("Failed to load configuration from {}", file.display()))?;
    }
    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}
