//! CLI surface and the [`HostConfig`] it produces (§6, §10.3).
//!
//! The three required configuration values — `fixed_delta_seconds`,
//! `local_node_id`, and the recording mode — are positional/flag arguments
//! with environment fallback, matching how the rest of the workspace
//! exposes both a CLI flag and an environment variable for service
//! configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

const DEFAULT_FIXED_DELTA_SECONDS: f64 = 1.0 / 60.0;

/// `host <instanceId> <mode> [recordingPath]`.
#[derive(Debug, Parser)]
#[command(name = "fdp_host", about = "Runs or replays a tick-recorded simulation")]
pub struct Cli {
    /// This host instance's id; also used as the local node id for
    /// replication ownership.
    pub instance_id: i32,

    /// `live` ticks the simulation and optionally records it;
    /// `replay` re-derives state from a recording and verifies its hashes.
    #[arg(value_enum)]
    pub mode: RunMode,

    /// Recording file path. Required for `replay`; optional for `live`
    /// (omit to run unrecorded).
    pub recording_path: Option<PathBuf>,

    /// Seconds of simulated time per tick.
    #[arg(long, env = "FDP_FIXED_DELTA_SECONDS", default_value_t = DEFAULT_FIXED_DELTA_SECONDS)]
    pub fixed_delta_seconds: f64,

    /// Ticks to run before stopping in `live` mode. 0 runs until
    /// interrupted.
    #[arg(long, env = "FDP_MAX_TICKS", default_value_t = 0)]
    pub max_ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    Live,
    Replay,
}

/// The resolved, validated configuration the run loop operates on.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub local_node_id: i32,
    pub mode: RunMode,
    pub recording_path: Option<PathBuf>,
    pub fixed_delta_seconds: f64,
    pub max_ticks: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("replay mode requires a recording path")]
    MissingRecordingPath,
    #[error("fixed_delta_seconds must be positive, got {0}")]
    NonPositiveDelta(f64),
}

impl HostConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.fixed_delta_seconds <= 0.0 {
            return Err(ConfigError::NonPositiveDelta(cli.fixed_delta_seconds));
        }
        if cli.mode == RunMode::Replay && cli.recording_path.is_none() {
            return Err(ConfigError::MissingRecordingPath);
        }
        Ok(Self {
            local_node_id: cli.instance_id,
            mode: cli.mode,
            recording_path: cli.recording_path,
            fixed_delta_seconds: cli.fixed_delta_seconds,
            max_ticks: cli.max_ticks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(mode: RunMode, path: Option<&str>) -> Cli {
        Cli {
            instance_id: 7,
            mode,
            recording_path: path.map(PathBuf::from),
            fixed_delta_seconds: DEFAULT_FIXED_DELTA_SECONDS,
            max_ticks: 0,
        }
    }

    #[test]
    fn test_live_without_recording_path_is_valid() {
        let config = HostConfig::from_cli(cli(RunMode::Live, None)).unwrap();
        assert_eq!(config.local_node_id, 7);
        assert!(config.recording_path.is_none());
    }

    #[test]
    fn test_replay_without_recording_path_is_rejected() {
        let err = HostConfig::from_cli(cli(RunMode::Replay, None)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRecordingPath));
    }

    #[test]
    fn test_replay_with_recording_path_is_valid() {
        let config = HostConfig::from_cli(cli(RunMode::Replay, Some("run.fdpr"))).unwrap();
        assert_eq!(config.recording_path, Some(PathBuf::from("run.fdpr")));
    }

    #[test]
    fn test_non_positive_delta_is_rejected() {
        let mut c = cli(RunMode::Live, None);
        c.fixed_delta_seconds = 0.0;
        assert!(matches!(
            HostConfig::from_cli(c).unwrap_err(),
            ConfigError::NonPositiveDelta(_)
        ));
    }
}
