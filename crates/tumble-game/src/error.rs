use std::path::PathBuf;

use thiserror::Error;
use tumble_config::ConfigError;
use tumble_level::LevelError;

/// Errors that end a game run.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("level error: {0}")]
    Level(#[from] LevelError),
    #[error("failed to read input script {path}: {source}")]
    ScriptRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse input script: {0}")]
    ScriptParse(#[from] ron::error::SpannedError),
    #[error("physics halted after a body left finite state")]
    SimulationHalted,
}
