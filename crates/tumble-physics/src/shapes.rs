//! Shape registry: binds rigid bodies to presentation transforms.
//!
//! The mirror pass is the only place body state is copied into a [`Visual`];
//! rendering reads visuals, never bodies. Entries may ask to be despawned from
//! their own tick hook; removals are collected during the pass and applied
//! after it.

use glam::{Quat, Vec3};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::plane::enforce_plane;
use crate::{PhysicsWorld, RigidBody, RigidBodyHandle, body_rotation, body_translation};

/// Stable identity of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

/// Whether the registry mirrors an entry every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Level geometry: visual attached once, never mirrored.
    Static,
    /// Simulated body: mirrored and hooked every tick.
    Dynamic,
}

/// Renderer hint carried alongside a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualHint {
    /// RGB colour.
    pub color: u32,
}

impl VisualHint {
    /// Default hint for moving bodies.
    pub const DYNAMIC: Self = Self { color: 0xFF_00_00 };
    /// Default hint for level geometry.
    pub const STATIC: Self = Self { color: 0x66_66_66 };
}

/// Presentation transform owned by the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    /// World position.
    pub translation: Vec3,
    /// World orientation.
    pub rotation: Quat,
    /// Renderer hint.
    pub hint: VisualHint,
}

/// Outcome of a tick hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeTick {
    /// Keep tracking the entry.
    Keep,
    /// Remove the entry and its body once the pass completes.
    Despawn,
}

/// Per-tick callback run after an entry has been mirrored.
///
/// `C` is the context the owner threads through [`ShapeRegistry::mirror`].
pub type TickHook<C> = Box<dyn FnMut(&mut C, &mut RigidBody) -> ShapeTick>;

struct ShapeEntry<C> {
    id: ShapeId,
    body: RigidBodyHandle,
    visual: Visual,
    hook: Option<TickHook<C>>,
}

/// Summary of one mirror pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// Entries mirrored this pass.
    pub mirrored: usize,
    /// Entries removed at the end of the pass.
    pub despawned: Vec<ShapeId>,
}

/// Registry of all bodies that have a presentation.
pub struct ShapeRegistry<C> {
    statics: Vec<ShapeEntry<C>>,
    dynamics: Vec<ShapeEntry<C>>,
    next_id: u64,
    plane_z: f32,
}

impl<C> ShapeRegistry<C> {
    /// Creates an empty registry pinning dynamic bodies to depth `plane_z`.
    pub fn new(plane_z: f32) -> Self {
        Self {
            statics: Vec::new(),
            dynamics: Vec::new(),
            next_id: 0,
            plane_z,
        }
    }

    /// Adds an entry for `body`.
    ///
    /// Static entries get their visual attached immediately and never run a
    /// hook; dynamic entries join the mirrored list.
    pub fn register(
        &mut self,
        world: &PhysicsWorld,
        body: RigidBodyHandle,
        kind: ShapeKind,
        hint: VisualHint,
        hook: Option<TickHook<C>>,
    ) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;

        let visual = match world.rigid_body_set.get(body) {
            Some(rb) => Visual {
                translation: body_translation(rb),
                rotation: body_rotation(rb),
                hint,
            },
            None => Visual {
                translation: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                hint,
            },
        };

        let entry = ShapeEntry {
            id,
            body,
            visual,
            hook,
        };
        match kind {
            ShapeKind::Static => {
                if entry.hook.is_some() {
                    debug!("Static shape {id:?} registered with a hook; it will never run");
                }
                self.statics.push(entry);
            }
            ShapeKind::Dynamic => self.dynamics.push(entry),
        }
        trace!("Registered {kind:?} shape {id:?}");
        id
    }

    /// Removes an entry and its rigid body.
    ///
    /// Returns `false` if the entry was already gone.
    pub fn unregister(&mut self, world: &mut PhysicsWorld, id: ShapeId) -> bool {
        let body = if let Some(pos) = self.dynamics.iter().position(|e| e.id == id) {
            self.dynamics.remove(pos).body
        } else if let Some(pos) = self.statics.iter().position(|e| e.id == id) {
            self.statics.remove(pos).body
        } else {
            return false;
        };
        world.remove_body(body);
        trace!("Unregistered shape {id:?}");
        true
    }

    /// Copies every dynamic body onto its visual, then runs its hook.
    ///
    /// Entries whose hook returns [`ShapeTick::Despawn`], or whose body has
    /// disappeared from the world, are removed after the whole pass.
    pub fn mirror(&mut self, world: &mut PhysicsWorld, ctx: &mut C) -> MirrorReport {
        let mut report = MirrorReport::default();
        let plane_z = self.plane_z;

        for entry in &mut self.dynamics {
            let Some(body) = world.rigid_body_set.get_mut(entry.body) else {
                report.despawned.push(entry.id);
                continue;
            };

            enforce_plane(body, plane_z);
            entry.visual.translation = body_translation(body);
            entry.visual.rotation = body_rotation(body);
            report.mirrored += 1;

            if let Some(hook) = entry.hook.as_mut()
                && hook(ctx, body) == ShapeTick::Despawn
            {
                report.despawned.push(entry.id);
            }
        }

        if !report.despawned.is_empty() {
            let doomed: FxHashSet<ShapeId> = report.despawned.iter().copied().collect();
            let mut removed_bodies = Vec::with_capacity(doomed.len());
            self.dynamics.retain(|entry| {
                let keep = !doomed.contains(&entry.id);
                if !keep {
                    removed_bodies.push(entry.body);
                }
                keep
            });
            for body in removed_bodies {
                world.remove_body(body);
            }
            debug!("Despawned {} shape(s) after mirror pass", doomed.len());
        }

        report
    }

    /// Returns the visual of an entry, if it is still registered.
    pub fn visual(&self, id: ShapeId) -> Option<&Visual> {
        self.find(id).map(|entry| &entry.visual)
    }

    /// Returns the rigid body handle behind an entry.
    pub fn body(&self, id: ShapeId) -> Option<RigidBodyHandle> {
        self.find(id).map(|entry| entry.body)
    }

    /// Returns `true` if the entry is registered.
    pub fn contains(&self, id: ShapeId) -> bool {
        self.find(id).is_some()
    }

    /// Visuals of all mirrored entries.
    pub fn dynamic_visuals(&self) -> impl Iterator<Item = (ShapeId, &Visual)> {
        self.dynamics.iter().map(|entry| (entry.id, &entry.visual))
    }

    /// Visuals of all level geometry.
    pub fn static_visuals(&self) -> impl Iterator<Item = (ShapeId, &Visual)> {
        self.statics.iter().map(|entry| (entry.id, &entry.visual))
    }

    /// Number of mirrored entries.
    pub fn dynamic_len(&self) -> usize {
        self.dynamics.len()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.statics.len() + self.dynamics.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find(&self, id: ShapeId) -> Option<&ShapeEntry<C>> {
        self.dynamics
            .iter()
            .chain(self.statics.iter())
            .find(|entry| entry.id == id)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rapier3d::prelude::*;

    use super::*;
    use crate::planar_body;

    fn add_cube(world: &mut PhysicsWorld, x: f32, y: f32) -> RigidBodyHandle {
        world
            .insert_body(
                planar_body(RigidBodyBuilder::dynamic())
                    .translation(Vector::new(x, y, 0.0))
                    .build(),
                ColliderBuilder::cuboid(0.5, 0.5, 0.5).build(),
            )
            .0
    }

    #[test]
    fn test_static_visual_attached_on_register() {
        let mut world = PhysicsWorld::new();
        let (ground, _) = world.insert_body(
            RigidBodyBuilder::fixed()
                .translation(Vector::new(8.0, 0.0, 0.0))
                .build(),
            ColliderBuilder::cuboid(10.0, 0.1, 1.0).build(),
        );
        let mut registry: ShapeRegistry<()> = ShapeRegistry::new(0.0);
        let id = registry.register(&world, ground, ShapeKind::Static, VisualHint::STATIC, None);

        assert_eq!(registry.visual(id).unwrap().translation, Vec3::new(8.0, 0.0, 0.0));
        assert_eq!(registry.static_visuals().count(), 1);
        assert_eq!(registry.dynamic_len(), 0);
    }

    #[test]
    fn test_mirror_copies_body_state() {
        let mut world = PhysicsWorld::new();
        let body = add_cube(&mut world, 0.0, 5.0);
        let mut registry: ShapeRegistry<()> = ShapeRegistry::new(0.0);
        let id = registry.register(&world, body, ShapeKind::Dynamic, VisualHint::DYNAMIC, None);

        for _ in 0..10 {
            world.step();
        }
        registry.mirror(&mut world, &mut ());

        let expected = body_translation(&world.rigid_body_set[body]);
        assert_eq!(registry.visual(id).unwrap().translation, expected);
        assert!(expected.y < 5.0);
    }

    #[test]
    fn test_mirror_pins_plane_depth() {
        let mut world = PhysicsWorld::new();
        let body = add_cube(&mut world, 0.0, 5.0);
        world.rigid_body_set[body].set_translation(Vector::new(0.0, 5.0, 2.0), false);
        let mut registry: ShapeRegistry<()> = ShapeRegistry::new(0.0);
        let id = registry.register(&world, body, ShapeKind::Dynamic, VisualHint::DYNAMIC, None);

        registry.mirror(&mut world, &mut ());

        assert_eq!(registry.visual(id).unwrap().translation.z, 0.0);
        assert_eq!(body_translation(&world.rigid_body_set[body]).z, 0.0);
    }

    #[test]
    fn test_hook_despawn_during_pass() {
        let mut world = PhysicsWorld::new();
        let doomed = add_cube(&mut world, 0.0, -30.0);
        let survivor = add_cube(&mut world, 2.0, 5.0);

        let mut registry: ShapeRegistry<Vec<RigidBodyHandle>> = ShapeRegistry::new(0.0);
        let doomed_id = registry.register(
            &world,
            doomed,
            ShapeKind::Dynamic,
            VisualHint::DYNAMIC,
            Some(Box::new(move |visits, body| {
                visits.push(doomed);
                if body_translation(body).y < -20.0 {
                    ShapeTick::Despawn
                } else {
                    ShapeTick::Keep
                }
            })),
        );
        let survivor_id = registry.register(
            &world,
            survivor,
            ShapeKind::Dynamic,
            VisualHint::DYNAMIC,
            Some(Box::new(move |visits, _| {
                visits.push(survivor);
                ShapeTick::Keep
            })),
        );

        let mut visits = Vec::new();
        let report = registry.mirror(&mut world, &mut visits);

        assert_eq!(visits, vec![doomed, survivor]);
        assert_eq!(report.despawned, vec![doomed_id]);
        assert!(!registry.contains(doomed_id));
        assert!(registry.contains(survivor_id));
        assert!(world.rigid_body_set.get(doomed).is_none());

        // The next pass no longer sees the removed entry.
        visits.clear();
        registry.mirror(&mut world, &mut visits);
        assert_eq!(visits, vec![survivor]);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut world = PhysicsWorld::new();
        let body = add_cube(&mut world, 0.0, 1.0);
        let mut registry: ShapeRegistry<()> = ShapeRegistry::new(0.0);
        let id = registry.register(&world, body, ShapeKind::Dynamic, VisualHint::DYNAMIC, None);

        assert!(registry.unregister(&mut world, id));
        assert!(!registry.unregister(&mut world, id));
        assert!(registry.is_empty());
        assert!(world.rigid_body_set.get(body).is_none());
    }

    #[test]
    fn test_missing_body_dropped_from_registry() {
        let mut world = PhysicsWorld::new();
        let body = add_cube(&mut world, 0.0, 1.0);
        let mut registry: ShapeRegistry<()> = ShapeRegistry::new(0.0);
        let id = registry.register(&world, body, ShapeKind::Dynamic, VisualHint::DYNAMIC, None);

        world.remove_body(body);
        let report = registry.mirror(&mut world, &mut ());

        assert_eq!(report.mirrored, 0);
        assert_eq!(report.despawned, vec![id]);
        assert!(!registry.contains(id));
    }
}
