//! Held intents: repeating behaviours driven from the fixed step.
//!
//! Each axis has exactly one intent slot. An intent owns a [`Pulse`]
//! accumulator; replacing or clearing the intent drops the accumulator with it,
//! so a released key can never fire a late pulse.

use glam::Quat;

/// Horizontal direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Left,
    #[default]
    Right,
}

impl Direction {
    /// `-1.0` for left, `1.0` for right.
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Fixed-period pulse generator fed by tick time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pulse {
    accumulated: f32,
}

impl Pulse {
    /// Adds `dt` and returns how many whole `period`s have now elapsed.
    pub fn advance(&mut self, dt: f32, period: f32) -> u32 {
        if period <= 0.0 {
            return 1;
        }
        self.accumulated += dt;
        let mut fired = 0;
        while self.accumulated >= period {
            self.accumulated -= period;
            fired += 1;
        }
        fired
    }

    /// Time carried toward the next pulse.
    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }
}

/// Repeating behaviour on the horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HorizontalIntent {
    #[default]
    Idle,
    /// A direction key is held.
    Move { dir: Direction, pulse: Pulse },
    /// Grounded active brake toward zero horizontal speed.
    Brake { elapsed: f32, pulse: Pulse },
}

impl HorizontalIntent {
    pub fn moving(dir: Direction) -> Self {
        HorizontalIntent::Move {
            dir,
            pulse: Pulse::default(),
        }
    }

    pub fn braking() -> Self {
        HorizontalIntent::Brake {
            elapsed: 0.0,
            pulse: Pulse::default(),
        }
    }

    /// Direction being held, if any.
    pub fn held_direction(&self) -> Option<Direction> {
        match self {
            HorizontalIntent::Move { dir, .. } => Some(*dir),
            _ => None,
        }
    }

    pub fn is_braking(&self) -> bool {
        matches!(self, HorizontalIntent::Brake { .. })
    }
}

/// Repeating behaviour on the spin axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AngularIntent {
    #[default]
    Idle,
    /// Driving spin until the body rotates back through neutral.
    Righting {
        /// Spin direction, `±1.0`.
        dir: f32,
        /// Sign of the quaternion z component when righting began.
        start_sign: f32,
        pulse: Pulse,
    },
    /// Interpolating residual tilt to neutral.
    Levelling { from: Quat, elapsed: f32 },
}

impl AngularIntent {
    pub fn righting(dir: f32, rotation_z: f32) -> Self {
        AngularIntent::Righting {
            dir: if dir < 0.0 { -1.0 } else { 1.0 },
            start_sign: if rotation_z < 0.0 { -1.0 } else { 1.0 },
            pulse: Pulse::default(),
        }
    }

    pub fn levelling(from: Quat) -> Self {
        AngularIntent::Levelling { from, elapsed: 0.0 }
    }

    pub fn is_righting(&self) -> bool {
        matches!(self, AngularIntent::Righting { .. })
    }

    pub fn is_levelling(&self) -> bool {
        matches!(self, AngularIntent::Levelling { .. })
    }
}

/// Moves `value` toward zero by `step` without changing its sign.
pub fn decay_toward_zero(value: f32, step: f32) -> f32 {
    if value.abs() <= step {
        0.0
    } else {
        value - value.signum() * step
    }
}

/// Pushes `value` by `step` in direction `sign`, stopping at `cap` along that
/// direction. Speed already past the cap is left alone.
pub fn push_toward_cap(value: f32, sign: f32, step: f32, cap: f32) -> f32 {
    let along = sign * value;
    if along >= cap {
        value
    } else {
        sign * (along + step).min(cap)
    }
}
