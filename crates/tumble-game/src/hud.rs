//! Read-only HUD telemetry.
//!
//! Gathers what an on-screen overlay would show from the player and its body
//! and formats it as a compact status line or a JSON record.

use serde::Serialize;
use tumble_physics::{PhysicsWorld, body_angvel, body_linvel};
use tumble_player::PlayerController;

/// HUD values captured once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    /// Controller clock time the jump charge began.
    pub charge_started_at: Option<f32>,
    /// Fraction of a full jump the current charge would give; 0 when idle.
    pub charge_fraction: f32,
    pub linvel: [f32; 3],
    pub angvel: [f32; 3],
    pub grounded: bool,
    pub stance: String,
}

impl HudSnapshot {
    /// Reads the player state. A missing body reports zero velocities.
    pub fn capture(player: &PlayerController, world: &PhysicsWorld) -> Self {
        let (linvel, angvel) = world
            .rigid_body_set
            .get(player.body())
            .map(|body| (body_linvel(body).to_array(), body_angvel(body).to_array()))
            .unwrap_or_default();

        Self {
            charge_started_at: player.charge_started_at(),
            charge_fraction: player.charge_level().map_or(0.0, |level| level.fraction()),
            linvel,
            angvel,
            grounded: player.is_grounded(),
            stance: player.stance().to_string(),
        }
    }

    /// One-line summary for console logs.
    pub fn status_line(&self) -> String {
        format!(
            "v=({:+.2}, {:+.2}) w={:+.2} {} {} charge={:.0}%",
            self.linvel[0],
            self.linvel[1],
            self.angvel[2],
            if self.grounded { "grounded" } else { "airborne" },
            self.stance,
            self.charge_fraction * 100.0,
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
