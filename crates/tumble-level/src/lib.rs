//! Level definition, construction and liveness: platforms, debris, the kill
//! plane, respawning and the follow camera.

pub mod camera;
pub mod debris;
pub mod def;
mod error;
pub mod level;

pub use camera::CameraRig;
pub use debris::{DEBRIS_HINT, spawn_debris};
pub use def::{DebrisDef, LevelDef, PlatformDef};
pub use error::LevelError;
pub use level::{BuiltPlatform, Level};
