//! Damage notifications raised by hard landings.
//!
//! Health is not tracked here; events queue up on the controller until the
//! owner drains them.

use tumble_config::PlayerConfig;

/// Why a landing hurt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageCause {
    /// Impact above the high threshold.
    HardImpact,
    /// Impact above the low threshold while landing tipped over.
    TippedImpact,
}

/// One damaging landing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub cause: DamageCause,
    /// Larger of the horizontal and vertical impact speeds, m/s.
    pub impact_speed: f32,
    /// Tilt relative to the surface at impact.
    pub tilt: f32,
    /// Controller clock at impact, seconds.
    pub at: f32,
}

/// Decides whether a floor landing causes damage.
pub fn assess_impact(
    impact_vx: f32,
    impact_vy: f32,
    excess_tilt: bool,
    tuning: &PlayerConfig,
) -> Option<(DamageCause, f32)> {
    let speed = impact_vx.abs().max(impact_vy.abs());
    if speed > tuning.damage_speed_high {
        Some((DamageCause::HardImpact, speed))
    } else if speed > tuning.damage_speed_low && excess_tilt {
        Some((DamageCause::TippedImpact, speed))
    } else {
        None
    }
}
