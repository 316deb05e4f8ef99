//! Loose dynamic cubes that clean themselves up once they fall out of the level.

use glam::Vec3;
use rapier3d::prelude::*;
use tracing::trace;
use tumble_physics::{
    PhysicsWorld, ShapeId, ShapeKind, ShapeRegistry, ShapeTick, VisualHint, body_translation,
    planar_body, to_rapier,
};

use crate::def::DebrisDef;

/// Hint used for debris visuals.
pub const DEBRIS_HINT: VisualHint = VisualHint { color: 0xC0_80_40 };

/// Adds a debris cube and registers it with a self-despawning hook.
///
/// The hook removes the cube once its centre drops below `kill_plane_y`.
pub fn spawn_debris<C: 'static>(
    world: &mut PhysicsWorld,
    registry: &mut ShapeRegistry<C>,
    def: &DebrisDef,
    kill_plane_y: f32,
) -> ShapeId {
    let [hx, hy, hz] = def.half_extents;
    let (body, _) = world.insert_body(
        planar_body(RigidBodyBuilder::dynamic())
            .translation(to_rapier(Vec3::from_array(def.center)))
            .build(),
        ColliderBuilder::cuboid(hx, hy, hz).mass(def.mass).friction(0.5).build(),
    );

    registry.register(
        world,
        body,
        ShapeKind::Dynamic,
        DEBRIS_HINT,
        Some(Box::new(move |_: &mut C, body: &mut RigidBody| {
            if body_translation(body).y < kill_plane_y {
                trace!("Debris fell below {kill_plane_y}; despawning");
                ShapeTick::Despawn
            } else {
                ShapeTick::Keep
            }
        })),
    )
}
