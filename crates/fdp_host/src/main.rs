//! # fdp_host — CLI host
//!
//! `fdp_host <instanceId> <live|replay> [recordingPath]` (§6). `live` ticks
//! the demo world (S1 movement, S2 area damage) at a fixed timestep,
//! optionally recording it; `replay` re-derives state from a recording and
//! verifies every tick's hash matches what was captured.
//!
//! Exit codes: 0 normal, 1 build/config failure, 2 runtime exception, 130
//! interrupted (§7).

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fdp_host::config::{Cli, HostConfig, RunMode};
use fdp_host::simulation::{run_live, run_replay, RuntimeError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fdp_host=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = match HostConfig::from_cli(cli) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "config error");
            std::process::exit(1);
        }
    };

    tracing::info!(
        local_node_id = config.local_node_id,
        mode = ?config.mode,
        fixed_delta_seconds = config.fixed_delta_seconds,
        "fdp_host starting"
    );

    let result = match config.mode {
        RunMode::Live => run_live(&config).await,
        RunMode::Replay => run_replay(&config),
    };

    match result {
        Ok(()) => {
            tracing::info!("fdp_host finished");
            Ok(())
        }
        Err(RuntimeError::Interrupted) => {
            tracing::info!("fdp_host interrupted");
            std::process::exit(130);
        }
        Err(err) => {
            tracing::error!(%err, "fdp_host exited with a runtime error");
            std::process::exit(2);
        }
    }
}
