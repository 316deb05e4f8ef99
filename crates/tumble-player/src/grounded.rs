//! Probe-based grounded detection.

use tumble_physics::{GroundIndex, PhysicsWorld, RigidBodyHandle, probe_ground};

use crate::stance::Stance;

/// Smallest cosine the slope scaling divides by.
const MIN_SLOPE_COS: f32 = 0.05;

/// Returns `true` if ground lies strictly closer below `body` than the
/// stance's tolerance.
///
/// The tolerance is measured along the surface normal, so on an incline of
/// angle `a` the vertical gap allowed is `tolerance / cos(a)`. Only colliders
/// in `ground` are considered; the player's own body never is. `range` caps
/// the probe length.
pub fn is_grounded(
    world: &PhysicsWorld,
    body: RigidBodyHandle,
    stance: Stance,
    ground: &GroundIndex,
    range: f32,
) -> bool {
    let tolerance = stance.preset().ground_tolerance;
    probe_ground(world, body, ground, range)
        .is_some_and(|hit| hit.distance < tolerance / hit.angle.cos().max(MIN_SLOPE_COS))
}
