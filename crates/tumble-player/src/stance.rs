//! Player stances and their collision-volume presets.

use std::fmt;

use glam::Vec3;

/// Collision volume and grounding tolerance for one stance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumePreset {
    /// Cuboid half-extents in metres.
    pub half_extents: Vec3,
    /// Largest centre-to-surface distance that still counts as grounded.
    pub ground_tolerance: f32,
}

impl VolumePreset {
    /// The 1 m cube.
    pub const UPRIGHT: Self = Self {
        half_extents: Vec3::new(0.5, 0.5, 0.5),
        ground_tolerance: 0.6,
    };

    /// Squashed vertically while spinning through the air.
    pub const TUMBLING: Self = Self {
        half_extents: Vec3::new(0.5, 0.38, 0.5),
        ground_tolerance: 0.48,
    };

    /// Widened and shortened to sit on an inclined platform.
    pub const TILTED: Self = Self {
        half_extents: Vec3::new(0.6, 0.42, 0.5),
        ground_tolerance: 0.45,
    };

    /// Scale relative to the upright cube, for squash/stretch rendering.
    pub fn visual_scale(&self) -> Vec3 {
        self.half_extents / Self::UPRIGHT.half_extents
    }
}

/// What the player body is currently doing, as far as its shape is concerned.
///
/// Tumbling and tilted are variants of one enum, so the player can never be
/// both at once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Stance {
    #[default]
    Upright,
    /// Airborne with high spin.
    Tumbling,
    /// Resting on an inclined platform of the given angle (radians).
    Tilted { angle: f32 },
}

impl Stance {
    /// The collision-volume preset for this stance.
    pub fn preset(&self) -> VolumePreset {
        match self {
            Stance::Upright => VolumePreset::UPRIGHT,
            Stance::Tumbling => VolumePreset::TUMBLING,
            Stance::Tilted { .. } => VolumePreset::TILTED,
        }
    }

    pub fn is_tumbling(&self) -> bool {
        matches!(self, Stance::Tumbling)
    }

    pub fn is_tilted(&self) -> bool {
        matches!(self, Stance::Tilted { .. })
    }

    /// Inclination of the platform the stance is fitted to; `0.0` otherwise.
    pub fn tilt_angle(&self) -> f32 {
        match self {
            Stance::Tilted { angle } => *angle,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stance::Upright => write!(f, "upright"),
            Stance::Tumbling => write!(f, "tumbling"),
            Stance::Tilted { angle } => write!(f, "tilted({angle:.2})"),
        }
    }
}
