//! Headless game loop: the frame-by-frame [`Simulation`], scripted
//! [`Controls`] and HUD telemetry.

pub mod controls;
mod error;
pub mod hud;
pub mod simulation;

pub use controls::{Controls, InputScript, Key, KeyEvent, ScriptPlayer, TimedKey};
pub use error::GameError;
pub use hud::HudSnapshot;
pub use simulation::{FrameReport, Simulation};
