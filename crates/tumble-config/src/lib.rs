//! Configuration system for Tumble.
//!
//! Provides the tuning of the physics loop, the player controller, the camera
//! and the level as RON files. Supports CLI overrides via clap, hot-reload
//! detection, and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CameraConfig, Config, DebugConfig, LevelConfig, PhysicsConfig, PlayerConfig};
pub use error::ConfigError;
