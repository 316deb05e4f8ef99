//! Command-line argument parsing for Tumble.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Tumble command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "tumble", about = "Tumble 2.5D platformer")]
pub struct CliArgs {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// RON level file to load instead of the built-in level.
    #[arg(long)]
    pub level: Option<PathBuf>,

    /// Maximum fixed physics steps per frame.
    #[arg(long)]
    pub max_substeps: Option<u32>,

    /// Lock the camera onto the player.
    #[arg(long)]
    pub lock_camera: Option<bool>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(ref file) = args.level {
            self.level.file = Some(file.clone());
        }
        if let Some(steps) = args.max_substeps {
            self.physics.max_substeps = steps.max(1);
        }
        if let Some(lock) = args.lock_camera {
            self.camera.lock_camera = lock;
        }
    }
}
