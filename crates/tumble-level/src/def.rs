//! Authored level data and its RON persistence.

use std::path::Path;

use glam::Vec3;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::LevelError;

/// A level as authored: platforms, debris, spawn and kill plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LevelDef {
    /// Display name.
    pub name: String,
    /// Player spawn position.
    pub spawn: [f32; 3],
    /// Anything whose centre drops below this height is dead.
    pub kill_plane_y: f32,
    /// Static ground geometry.
    pub platforms: Vec<PlatformDef>,
    /// Loose dynamic cubes.
    pub debris: Vec<DebrisDef>,
}

/// One static platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlatformDef {
    /// Unique identifier within the level.
    pub id: String,
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
    /// Fixed tilt about z in radians; `None` for level ground.
    pub inclination: Option<f32>,
    pub friction: f32,
}

/// One loose cube.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebrisDef {
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
    pub mass: f32,
}

impl Default for LevelDef {
    fn default() -> Self {
        Self {
            name: "untitled".to_string(),
            spawn: [0.0, 8.0, 0.0],
            kill_plane_y: -20.0,
            platforms: Vec::new(),
            debris: Vec::new(),
        }
    }
}

impl Default for PlatformDef {
    fn default() -> Self {
        Self {
            id: String::new(),
            center: [0.0; 3],
            half_extents: [1.0, 0.1, 1.0],
            inclination: None,
            friction: 0.3,
        }
    }
}

impl Default for DebrisDef {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            half_extents: [0.25, 0.25, 0.25],
            mass: 5.0,
        }
    }
}

impl PlatformDef {
    /// Inclination in radians, `0.0` when level.
    pub fn angle(&self) -> f32 {
        self.inclination.unwrap_or(0.0)
    }
}

impl LevelDef {
    /// The level used when no file is configured.
    pub fn builtin() -> Self {
        Self {
            name: "first steps".to_string(),
            spawn: [0.0, 8.0, 0.0],
            kill_plane_y: -20.0,
            platforms: vec![
                PlatformDef {
                    id: "ground".to_string(),
                    center: [8.0, 0.0, 0.0],
                    half_extents: [10.0, 0.1, 1.0],
                    ..Default::default()
                },
                PlatformDef {
                    id: "ledge".to_string(),
                    center: [10.0, 3.0, 0.0],
                    half_extents: [2.5, 0.1, 1.0],
                    ..Default::default()
                },
                PlatformDef {
                    id: "ramp".to_string(),
                    center: [21.0, 0.9, 0.0],
                    half_extents: [3.0, 0.1, 1.0],
                    inclination: Some(0.3),
                    ..Default::default()
                },
            ],
            debris: vec![
                DebrisDef {
                    center: [4.0, 6.0, 0.0],
                    ..Default::default()
                },
                DebrisDef {
                    center: [14.0, 9.0, 0.0],
                    half_extents: [0.4, 0.4, 0.4],
                    mass: 10.0,
                },
            ],
        }
    }

    pub fn spawn_point(&self) -> Vec3 {
        Vec3::from_array(self.spawn)
    }

    /// Rejects geometry that cannot be simulated.
    pub fn validate(&self) -> Result<(), LevelError> {
        if !Vec3::from_array(self.spawn).is_finite() {
            return Err(LevelError::Invalid("spawn is not finite".to_string()));
        }
        if !self.kill_plane_y.is_finite() || self.kill_plane_y >= self.spawn[1] {
            return Err(LevelError::Invalid(format!(
                "kill plane {} must lie below the spawn",
                self.kill_plane_y
            )));
        }
        if let Some(dup) = first_duplicate(self.platforms.iter().map(|p| p.id.as_str())) {
            return Err(LevelError::Invalid(format!("duplicate platform id {dup:?}")));
        }
        for platform in &self.platforms {
            check_box(&platform.id, platform.center, platform.half_extents)?;
            let angle = platform.angle();
            if !angle.is_finite() || angle.abs() >= std::f32::consts::FRAC_PI_2 {
                return Err(LevelError::Invalid(format!(
                    "platform {:?} inclination {angle} out of range",
                    platform.id
                )));
            }
        }
        for (i, debris) in self.debris.iter().enumerate() {
            check_box(&format!("debris #{i}"), debris.center, debris.half_extents)?;
            if !(debris.mass.is_finite() && debris.mass > 0.0) {
                return Err(LevelError::Invalid(format!("debris #{i} mass must be positive")));
            }
        }
        Ok(())
    }

    /// Loads and validates a level from a RON file.
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LevelError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let level: LevelDef = ron::from_str(&contents).map_err(LevelError::ParseError)?;
        level.validate()?;
        tracing::info!(
            "Loaded level {:?} from {} ({} platforms)",
            level.name,
            path.display(),
            level.platforms.len()
        );
        Ok(level)
    }

    /// Writes the level as pretty RON.
    pub fn save(&self, path: &Path) -> Result<(), LevelError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(LevelError::WriteError)?;
        }
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(LevelError::SerializeError)?;
        std::fs::write(path, serialized).map_err(LevelError::WriteError)
    }
}

fn first_duplicate<'a>(ids: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = FxHashSet::default();
    ids.into_iter().find(|id| !seen.insert(*id))
}

fn check_box(label: &str, center: [f32; 3], half_extents: [f32; 3]) -> Result<(), LevelError> {
    let center = Vec3::from_array(center);
    let half = Vec3::from_array(half_extents);
    if !center.is_finite() || !half.is_finite() || half.min_element() <= 0.0 {
        return Err(LevelError::Invalid(format!(
            "{label} needs a finite centre and positive half-extents"
        )));
    }
    Ok(())
}
