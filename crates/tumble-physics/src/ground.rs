//! Ground surfaces and the downward grounding probe.

use rustc_hash::FxHashMap;

use rapier3d::prelude::*;

use crate::{ColliderHandle, PhysicsWorld, RigidBodyHandle};

/// Metadata for a collider that counts as walkable ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSurface {
    /// Platform inclination about z, in radians. Flat ground is `0.0`.
    pub angle: f32,
}

/// Lookup from collider to ground surface.
#[derive(Debug, Clone, Default)]
pub struct GroundIndex {
    surfaces: FxHashMap<ColliderHandle, GroundSurface>,
}

impl GroundIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `collider` as ground.
    pub fn insert(&mut self, collider: ColliderHandle, surface: GroundSurface) {
        self.surfaces.insert(collider, surface);
    }

    /// Forgets `collider`. Returns the surface it had, if any.
    pub fn remove(&mut self, collider: ColliderHandle) -> Option<GroundSurface> {
        self.surfaces.remove(&collider)
    }

    /// Surface metadata for `collider`, if it is ground.
    pub fn get(&self, collider: ColliderHandle) -> Option<&GroundSurface> {
        self.surfaces.get(&collider)
    }

    /// Returns `true` if `collider` is ground.
    pub fn contains(&self, collider: ColliderHandle) -> bool {
        self.surfaces.contains_key(&collider)
    }

    /// Number of ground colliders.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns `true` if no ground is registered.
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// Result of a successful ground probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    /// Ground collider that was hit.
    pub collider: ColliderHandle,
    /// Distance from the body centre to the hit point.
    pub distance: f32,
    /// Inclination of the surface that was hit.
    pub angle: f32,
}

/// Casts a ray straight down from the body centre against ground colliders.
///
/// The body's own colliders and anything not in `ground` are ignored. Returns
/// `None` when the body is missing or nothing is hit within `range`. Colliders
/// inserted since the last [`PhysicsWorld::step`] are not yet visible.
pub fn probe_ground(
    world: &PhysicsWorld,
    body: RigidBodyHandle,
    ground: &GroundIndex,
    range: f32,
) -> Option<GroundHit> {
    let rb = world.rigid_body_set.get(body)?;
    let origin = rb.translation();

    let only_ground = |handle: ColliderHandle, _: &Collider| ground.contains(handle);
    let filter = QueryFilter::new()
        .exclude_rigid_body(body)
        .predicate(&only_ground);

    let query_pipeline = world.broad_phase.as_query_pipeline(
        world.narrow_phase.query_dispatcher(),
        &world.rigid_body_set,
        &world.collider_set,
        filter,
    );

    let ray = Ray::new(
        Vector::new(origin.x, origin.y, origin.z),
        Vector::new(0.0, -1.0, 0.0),
    );
    let (collider, distance) = query_pipeline.cast_ray(&ray, range, true)?;
    let angle = ground.get(collider).map_or(0.0, |surface| surface.angle);

    Some(GroundHit {
        collider,
        distance,
        angle,
    })
}
