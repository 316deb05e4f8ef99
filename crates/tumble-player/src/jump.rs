//! Charge-based jump strength.

use tumble_config::PlayerConfig;

/// How far along a held jump charge is, for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargeLevel {
    /// Below the window; fraction of a full charge in `[floor/window, 1)`.
    Partial(f32),
    /// Within the window plus the grace band.
    Full,
    /// Held past the grace band. Strength stays saturated.
    Overcharged,
}

impl ChargeLevel {
    /// Fraction of a full jump this charge would produce.
    pub fn fraction(&self) -> f32 {
        match self {
            ChargeLevel::Partial(f) => *f,
            ChargeLevel::Full | ChargeLevel::Overcharged => 1.0,
        }
    }
}

/// Effective charge duration: raised to the floor, saturated at the window.
///
/// The window wins when a floor above it slips through.
pub fn effective_charge(held: f32, tuning: &PlayerConfig) -> f32 {
    let held = if held.is_finite() { held } else { 0.0 };
    held.max(tuning.jump_charge_floor).min(tuning.jump_charge_window)
}

/// Share of a full charge, in `[0, 1]`. A window that is not positive counts
/// every charge as full.
fn charge_fraction(held: f32, tuning: &PlayerConfig) -> f32 {
    let window = tuning.jump_charge_window;
    if window.is_nan() || window <= 0.0 {
        return 1.0;
    }
    (effective_charge(held, tuning) / window).clamp(0.0, 1.0)
}

/// Upward velocity for a charge held for `held` seconds.
pub fn jump_velocity(held: f32, tuning: &PlayerConfig) -> f32 {
    tuning.jump_strength * charge_fraction(held, tuning)
}

/// Display classification of a charge held for `held` seconds.
pub fn charge_level(held: f32, tuning: &PlayerConfig) -> ChargeLevel {
    if held >= tuning.jump_charge_window + tuning.jump_charge_grace {
        ChargeLevel::Overcharged
    } else if held >= tuning.jump_charge_window {
        ChargeLevel::Full
    } else {
        ChargeLevel::Partial(charge_fraction(held, tuning))
    }
}
