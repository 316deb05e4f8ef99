//! A level built into a physics world.

use glam::Vec3;
use rapier3d::prelude::*;
use tracing::{debug, info};
use tumble_physics::{
    GroundIndex, GroundSurface, PhysicsWorld, ShapeId, ShapeKind, ShapeRegistry, VisualHint,
    body_translation, is_body_finite, to_rapier,
};
use tumble_player::PlayerController;

use crate::debris::spawn_debris;
use crate::def::LevelDef;

/// A platform that exists in the world.
#[derive(Debug, Clone)]
pub struct BuiltPlatform {
    pub id: String,
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub shape: ShapeId,
    pub angle: f32,
}

/// Built level: platform handles, the ground index, spawn and kill plane.
pub struct Level {
    def: LevelDef,
    ground: GroundIndex,
    platforms: Vec<BuiltPlatform>,
}

impl Level {
    /// Creates fixed bodies for every platform and registers them as ground.
    ///
    /// Debris is not spawned here; see [`Level::spawn_debris`].
    pub fn build<C>(def: LevelDef, world: &mut PhysicsWorld, registry: &mut ShapeRegistry<C>) -> Self {
        let mut ground = GroundIndex::new();
        let mut platforms = Vec::with_capacity(def.platforms.len());

        for platform in &def.platforms {
            let angle = platform.angle();
            let [hx, hy, hz] = platform.half_extents;
            let (body, collider) = world.insert_body(
                RigidBodyBuilder::fixed()
                    .translation(to_rapier(Vec3::from_array(platform.center)))
                    .rotation(Vector::new(0.0, 0.0, angle))
                    .build(),
                ColliderBuilder::cuboid(hx, hy, hz)
                    .friction(platform.friction)
                    .build(),
            );
            ground.insert(collider, GroundSurface { angle });
            let shape = registry.register(world, body, ShapeKind::Static, VisualHint::STATIC, None);
            debug!("Platform {:?} at {:?} (angle {angle})", platform.id, platform.center);

            platforms.push(BuiltPlatform {
                id: platform.id.clone(),
                body,
                collider,
                shape,
                angle,
            });
        }

        info!("Built level {:?}: {} platform(s)", def.name, platforms.len());
        Self {
            def,
            ground,
            platforms,
        }
    }

    /// Spawns every debris cube the level defines.
    pub fn spawn_debris<C: 'static>(
        &self,
        world: &mut PhysicsWorld,
        registry: &mut ShapeRegistry<C>,
    ) -> Vec<ShapeId> {
        self.def
            .debris
            .iter()
            .map(|debris| spawn_debris(world, registry, debris, self.def.kill_plane_y))
            .collect()
    }

    pub fn def(&self) -> &LevelDef {
        &self.def
    }

    /// Colliders the player can stand on.
    pub fn ground(&self) -> &GroundIndex {
        &self.ground
    }

    pub fn platforms(&self) -> &[BuiltPlatform] {
        &self.platforms
    }

    pub fn platform(&self, id: &str) -> Option<&BuiltPlatform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    pub fn spawn_point(&self) -> Vec3 {
        self.def.spawn_point()
    }

    pub fn kill_plane_y(&self) -> f32 {
        self.def.kill_plane_y
    }

    /// Whether the player fell out of the level or its body went non-finite.
    ///
    /// A player whose body no longer exists is not dead; there is nothing to
    /// reset.
    pub fn is_player_dead(&self, player: &PlayerController, world: &PhysicsWorld) -> bool {
        let Some(body) = world.rigid_body_set.get(player.body()) else {
            return false;
        };
        !is_body_finite(body) || body_translation(body).y < self.def.kill_plane_y
    }

    /// Sends the player back to spawn with all motion state cleared.
    pub fn respawn_player(&self, player: &mut PlayerController, world: &mut PhysicsWorld) {
        player.respawn(world, self.spawn_point());
    }
}
