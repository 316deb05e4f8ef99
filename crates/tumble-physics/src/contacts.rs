//! Contact-start tracking and collision classification.
//!
//! Rapier exposes contacts as persistent pairs in the narrow phase. The
//! [`ContactTracker`] turns them into discrete "contact began" events for a
//! small set of watched colliders, tagged with the body velocity from just
//! before the step that produced the contact.

use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::ground::GroundIndex;
use crate::{ColliderHandle, PhysicsWorld, RigidBodyHandle, UP, body_angvel, body_linvel};

/// Default minimum `normal · up` for a contact to count as floor.
pub const FLOOR_NORMAL_THRESHOLD: f32 = 0.5;

/// A contact that started during the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// First collider of the pair as Rapier reports it.
    pub collider1: ColliderHandle,
    /// Second collider of the pair.
    pub collider2: ColliderHandle,
    /// World-space manifold normal, pointing from `collider1` to `collider2`.
    pub normal: Vec3,
    /// Linear velocity of the watched body before the step.
    pub impact_linvel: Vec3,
    /// Angular velocity of the watched body before the step.
    pub impact_angvel: Vec3,
}

/// A [`ContactEvent`] seen from the watched collider's side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactClass {
    /// The collider that was hit.
    pub other: ColliderHandle,
    /// Normal pointing from the other collider toward the watched one.
    pub normal: Vec3,
    /// `normal · up` exceeds the floor threshold.
    pub is_floor_like: bool,
    /// Authored inclination of the hit surface; `0.0` for level or non-ground.
    pub platform_angle: f32,
    /// Whether the other collider belongs to the ground index.
    pub is_ground: bool,
}

#[derive(Debug, Default)]
struct Watched {
    body: Option<RigidBodyHandle>,
    touching: FxHashSet<ColliderHandle>,
    linvel: Vec3,
    angvel: Vec3,
}

/// Queues contact-start events for watched colliders.
#[derive(Debug, Default)]
pub struct ContactTracker {
    watched: FxHashMap<ColliderHandle, Watched>,
    events: Vec<ContactEvent>,
}

impl ContactTracker {
    /// Creates a tracker with nothing watched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `collider`. Contacts already touching are not reported.
    pub fn watch(&mut self, world: &PhysicsWorld, collider: ColliderHandle) {
        let body = world
            .collider_set
            .get(collider)
            .and_then(|c| c.parent());
        let touching = touching_set(world, collider);
        self.watched.insert(
            collider,
            Watched {
                body,
                touching,
                ..Default::default()
            },
        );
    }

    /// Stops watching `collider` and drops its queued events.
    pub fn unwatch(&mut self, collider: ColliderHandle) {
        self.watched.remove(&collider);
        self.events
            .retain(|e| e.collider1 != collider && e.collider2 != collider);
    }

    /// Forgets the touching set of `collider`, so every current contact is
    /// reported again after the next step. Used after teleports.
    pub fn reset(&mut self, collider: ColliderHandle) {
        if let Some(watched) = self.watched.get_mut(&collider) {
            watched.touching.clear();
        }
    }

    /// Snapshots watched body velocities; call right before stepping.
    pub fn before_step(&mut self, world: &PhysicsWorld) {
        for watched in self.watched.values_mut() {
            if let Some(body) = watched.body.and_then(|h| world.rigid_body_set.get(h)) {
                watched.linvel = body_linvel(body);
                watched.angvel = body_angvel(body);
            }
        }
    }

    /// Diffs current contacts against the previous step and queues new ones.
    pub fn after_step(&mut self, world: &PhysicsWorld) {
        for (&collider, watched) in &mut self.watched {
            let mut now_touching = FxHashSet::default();

            for pair in world.narrow_phase.contact_pairs_with(collider) {
                if !pair.has_any_active_contact() {
                    continue;
                }
                let other = if pair.collider1 == collider {
                    pair.collider2
                } else {
                    pair.collider1
                };
                now_touching.insert(other);

                if watched.touching.contains(&other) {
                    continue;
                }
                let Some(manifold) = pair.manifolds.iter().find(|m| !m.contacts().is_empty()) else {
                    continue;
                };
                let n = manifold.data.normal;
                let event = ContactEvent {
                    collider1: pair.collider1,
                    collider2: pair.collider2,
                    normal: Vec3::new(n.x, n.y, n.z),
                    impact_linvel: watched.linvel,
                    impact_angvel: watched.angvel,
                };
                trace!("Contact began: {event:?}");
                self.events.push(event);
            }

            watched.touching = now_touching;
        }
    }

    /// Takes all queued events.
    pub fn drain(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of queued events.
    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

fn touching_set(world: &PhysicsWorld, collider: ColliderHandle) -> FxHashSet<ColliderHandle> {
    world
        .narrow_phase
        .contact_pairs_with(collider)
        .filter(|pair| pair.has_any_active_contact())
        .map(|pair| {
            if pair.collider1 == collider {
                pair.collider2
            } else {
                pair.collider1
            }
        })
        .collect()
}

/// Orients `event` from `watched`'s point of view and tags the surface.
///
/// Uses [`FLOOR_NORMAL_THRESHOLD`]; see [`classify_with_threshold`].
pub fn classify(event: &ContactEvent, watched: ColliderHandle, ground: &GroundIndex) -> ContactClass {
    classify_with_threshold(event, watched, ground, FLOOR_NORMAL_THRESHOLD)
}

/// [`classify`] with an explicit floor threshold.
pub fn classify_with_threshold(
    event: &ContactEvent,
    watched: ColliderHandle,
    ground: &GroundIndex,
    floor_threshold: f32,
) -> ContactClass {
    // Rapier's normal leaves collider1; flip it so it leaves the surface.
    let (other, normal) = if event.collider1 == watched {
        (event.collider2, -event.normal)
    } else {
        (event.collider1, event.normal)
    };

    let surface = ground.get(other);
    ContactClass {
        other,
        normal,
        is_floor_like: normal.dot(UP) > floor_threshold,
        platform_angle: surface.map_or(0.0, |s| s.angle),
        is_ground: surface.is_some(),
    }
}
