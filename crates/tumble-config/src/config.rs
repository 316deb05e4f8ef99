//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level game configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Fixed-step physics loop settings.
    pub physics: PhysicsConfig,
    /// Player controller tuning.
    pub player: PlayerConfig,
    /// Camera follow settings.
    pub camera: CameraConfig,
    /// Level selection.
    pub level: LevelConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Physics loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical gravity in m/s² (negative = down).
    pub gravity_y: f32,
    /// Fixed simulation timestep in seconds.
    pub timestep: f32,
    /// Maximum number of fixed steps run for a single frame.
    pub max_substeps: u32,
    /// Depth of the gameplay plane; every planar body is pinned to this z.
    pub plane_z: f32,
}

/// Player controller tuning.
///
/// Speeds are in m/s, spins in rad/s, durations in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Player body mass in kilograms.
    pub mass: f32,
    /// Surface friction of the player collider.
    pub friction: f32,
    /// Horizontal speed cap.
    pub max_speed: f32,
    /// Spin cap while tumbling.
    pub max_tumble_speed: f32,
    /// Upward velocity of a fully charged jump.
    pub jump_strength: f32,
    /// Charge duration that yields a full jump.
    pub jump_charge_window: f32,
    /// Shortest charge duration; shorter charges are raised to it.
    pub jump_charge_floor: f32,
    /// Band after the window still shown as full charge.
    pub jump_charge_grace: f32,
    /// Period of held-intent pulses (movement, braking, righting).
    pub pulse_period: f32,
    /// Horizontal velocity added per grounded movement pulse.
    pub move_step: f32,
    /// Share of `move_step` applied while airborne.
    pub airborne_factor: f32,
    /// Spin added per airborne movement pulse.
    pub airborne_spin_step: f32,
    /// Velocity removed per braking pulse.
    pub brake_step: f32,
    /// Longest a grounded brake may run.
    pub brake_timeout: f32,
    /// Airborne spin above which the tumbling stance is entered.
    pub tumble_enter_spin: f32,
    /// Airborne spin below which the tumbling stance is left.
    pub tumble_exit_spin: f32,
    /// Quaternion z-component beyond which a landing counts as tipped over.
    pub tilt_tolerance: f32,
    /// Minimum `normal · up` for a contact to count as floor.
    pub floor_normal_threshold: f32,
    /// Spin applied by the self-righting intent.
    pub righting_speed: f32,
    /// Duration of the residual-tilt levelling slerp.
    pub level_duration: f32,
    /// Delay after a jump before an inclined stance is released.
    pub tilt_release_delay: f32,
    /// Impact speed that damages only when combined with excess tilt.
    pub damage_speed_low: f32,
    /// Impact speed that always damages.
    pub damage_speed_high: f32,
    /// Residual vertical velocity and spin zeroed while grounded.
    pub settle_epsilon: f32,
    /// Spin at which an inclined stance is force-cleared.
    pub runaway_spin: f32,
    /// Length of the downward ground probe.
    pub ground_probe_range: f32,
}

/// Camera follow configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Follow the player every frame.
    pub lock_camera: bool,
    /// Camera offset from the player position.
    pub offset: [f32; 3],
    /// Per-frame interpolation factor toward the target (1.0 = snap).
    pub follow_lerp: f32,
}

/// Level selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LevelConfig {
    /// RON level file; the built-in level is used when unset.
    pub file: Option<PathBuf>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Seconds of simulated time between HUD log lines.
    pub hud_interval_s: f32,
    /// Seconds of simulated time between config file checks; 0 disables.
    pub reload_interval_s: f32,
}

// --- Default implementations ---

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity_y: -9.82,
            timestep: 1.0 / 60.0,
            max_substeps: 5,
            plane_z: 0.0,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mass: 50.0,
            friction: 0.01,
            max_speed: 5.0,
            max_tumble_speed: 12.0,
            jump_strength: 9.0,
            jump_charge_window: 0.5,
            jump_charge_floor: 0.17,
            jump_charge_grace: 0.08,
            pulse_period: 0.02,
            move_step: 0.4,
            airborne_factor: 0.32,
            airborne_spin_step: 0.35,
            brake_step: 0.25,
            brake_timeout: 1.0,
            tumble_enter_spin: 6.0,
            tumble_exit_spin: 2.5,
            tilt_tolerance: 0.3,
            floor_normal_threshold: 0.5,
            righting_speed: 6.0,
            level_duration: 0.12,
            tilt_release_delay: 0.15,
            damage_speed_low: 8.0,
            damage_speed_high: 12.0,
            settle_epsilon: 0.05,
            runaway_spin: 15.0,
            ground_probe_range: 1.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lock_camera: true,
            offset: [1.0, 1.0, 15.0],
            follow_lerp: 1.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            hud_interval_s: 0.5,
            reload_interval_s: 1.0,
        }
    }
}

impl PlayerConfig {
    /// Jump velocity produced by the shortest accepted charge.
    pub fn min_jump_velocity(&self) -> f32 {
        if self.jump_charge_window.is_nan() || self.jump_charge_window <= 0.0 {
            return self.jump_strength;
        }
        self.jump_strength * (self.jump_charge_floor / self.jump_charge_window).clamp(0.0, 1.0)
    }

    /// Rejects tuning the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("jump_charge_window", self.jump_charge_window),
            ("pulse_period", self.pulse_period),
            ("mass", self.mass),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("player.{name} must be positive, got {value}")));
            }
        }
        if !(self.jump_charge_floor.is_finite() && self.jump_charge_floor >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "player.jump_charge_floor must be non-negative, got {}",
                self.jump_charge_floor
            )));
        }
        if self.jump_charge_floor > self.jump_charge_window {
            return Err(ConfigError::Invalid(format!(
                "player.jump_charge_floor {} exceeds jump_charge_window {}",
                self.jump_charge_floor, self.jump_charge_window
            )));
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Default per-user config directory (`<config dir>/tumble`).
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("tumble"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.player.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.player.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
