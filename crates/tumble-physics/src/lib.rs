//! Physics integration for the 2.5D platformer: fixed stepping, shape
//! tracking, ground probing and contact classification.
//!
//! Wraps the Rapier 3D physics engine behind a single [`PhysicsWorld`] that
//! owns all simulation state. Gameplay happens in a vertical plane; planar
//! bodies are built with their out-of-plane axes locked (see [`plane`]).

pub mod contacts;
pub mod ground;
pub mod plane;
pub mod shapes;
pub mod stepper;

pub use contacts::{
    ContactClass, ContactEvent, ContactTracker, FLOOR_NORMAL_THRESHOLD, classify, classify_with_threshold,
};
pub use ground::{GroundHit, GroundIndex, GroundSurface, probe_ground};
pub use plane::{enforce_plane, planar_body, project_rotation, tilt_angle};
pub use shapes::{MirrorReport, ShapeId, ShapeKind, ShapeRegistry, ShapeTick, TickHook, Visual, VisualHint};
pub use stepper::{PhysicsStepper, StepPhase, StepReport};

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

pub use rapier3d::prelude::{ColliderHandle, RigidBody, RigidBodyHandle};

/// Fixed simulation timestep (60 Hz).
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// World "up"; gravity pulls along its negation.
pub const UP: Vec3 = Vec3::Y;

/// Central physics simulation state owning all Rapier sets.
pub struct PhysicsWorld {
    /// World-space gravity vector.
    pub gravity: Vector,
    /// Timestep and solver configuration.
    pub integration_parameters: IntegrationParameters,
    /// The main simulation pipeline.
    pub physics_pipeline: PhysicsPipeline,
    /// Tracks sleeping/awake body islands.
    pub island_manager: IslandManager,
    /// Broad-phase collision detection (also provides query pipeline).
    pub broad_phase: BroadPhaseBvh,
    /// Narrow-phase collision detection (contact manifolds).
    pub narrow_phase: NarrowPhase,
    /// All rigid bodies in the simulation.
    pub rigid_body_set: RigidBodySet,
    /// All colliders in the simulation.
    pub collider_set: ColliderSet,
    /// Impulse-based joints.
    pub impulse_joint_set: ImpulseJointSet,
    /// Multibody joints.
    pub multibody_joint_set: MultibodyJointSet,
    /// Continuous collision detection solver.
    pub ccd_solver: CCDSolver,
}

impl PhysicsWorld {
    /// Creates a world with gravity `(0, -9.82, 0)` and a `1/60` s timestep.
    pub fn new() -> Self {
        Self::with_settings(-9.82, FIXED_DT)
    }

    /// Creates a world with the given vertical gravity and fixed timestep.
    pub fn with_settings(gravity_y: f32, dt: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt,
            ..Default::default()
        };

        Self {
            gravity: Vector::new(0.0, gravity_y, 0.0),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Advances the simulation by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Fixed timestep in seconds.
    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Sets the world gravity vector.
    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) {
        self.gravity = Vector::new(x, y, z);
    }

    /// Returns the current gravity as `(x, y, z)`.
    pub fn gravity(&self) -> (f32, f32, f32) {
        (self.gravity.x, self.gravity.y, self.gravity.z)
    }

    /// Inserts a body with one attached collider, returning both handles.
    pub fn insert_body(
        &mut self,
        body: RigidBody,
        collider: Collider,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body_handle = self.rigid_body_set.insert(body);
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        (body_handle, collider_handle)
    }

    /// Removes a body and its colliders. Returns `false` if it was already gone.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    /// Handle of the first dynamic body whose state is no longer finite.
    pub fn find_non_finite_body(&self) -> Option<RigidBodyHandle> {
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.is_dynamic())
            .find(|(_, body)| !is_body_finite(body))
            .map(|(handle, _)| handle)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// glam <-> rapier conversions
// ---------------------------------------------------------------------------
//
// Rapier may re-export a different glam version than the workspace, so every
// crossing goes through scalar components.

/// Converts a workspace `Vec3` to a Rapier vector.
pub fn to_rapier(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

/// Converts a workspace `Quat` to a Rapier rotation.
pub fn to_rapier_rotation(q: Quat) -> rapier3d::math::Rotation {
    rapier3d::math::Rotation::from_xyzw(q.x, q.y, q.z, q.w)
}

/// Body translation as a workspace `Vec3`.
pub fn body_translation(body: &RigidBody) -> Vec3 {
    let t = body.translation();
    Vec3::new(t.x, t.y, t.z)
}

/// Body orientation as a workspace `Quat`.
pub fn body_rotation(body: &RigidBody) -> Quat {
    let r = body.rotation();
    Quat::from_xyzw(r.x, r.y, r.z, r.w)
}

/// Body linear velocity as a workspace `Vec3`.
pub fn body_linvel(body: &RigidBody) -> Vec3 {
    let v = body.linvel();
    Vec3::new(v.x, v.y, v.z)
}

/// Body angular velocity as a workspace `Vec3`.
pub fn body_angvel(body: &RigidBody) -> Vec3 {
    let w = body.angvel();
    Vec3::new(w.x, w.y, w.z)
}

/// Returns `true` if position, orientation and velocities are all finite.
pub fn is_body_finite(body: &RigidBody) -> bool {
    body_translation(body).is_finite()
        && body_rotation(body).is_finite()
        && body_linvel(body).is_finite()
        && body_angvel(body).is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physics_world_initializes() {
        let world = PhysicsWorld::new();
        assert_eq!(world.rigid_body_set.len(), 0);
        assert_eq!(world.collider_set.len(), 0);
    }

    #[test]
    fn test_gravity_default() {
        let world = PhysicsWorld::new();
        assert_eq!(world.gravity(), (0.0, -9.82, 0.0));
    }

    #[test]
    fn test_timestep_matches_fixed_dt() {
        let world = PhysicsWorld::new();
        assert!((world.dt() - 1.0 / 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_step_advances_simulation() {
        let mut world = PhysicsWorld::new();
        let (handle, _) = world.insert_body(
            RigidBodyBuilder::dynamic()
                .translation(Vector::new(0.0, 10.0, 0.0))
                .build(),
            ColliderBuilder::ball(0.5).build(),
        );

        for _ in 0..60 {
            world.step();
        }

        let y = body_translation(&world.rigid_body_set[handle]).y;
        assert!(y < 10.0, "Body should have fallen: y={y}");
    }

    #[test]
    fn test_remove_body_is_idempotent() {
        let mut world = PhysicsWorld::new();
        let (handle, collider) = world.insert_body(
            RigidBodyBuilder::dynamic().build(),
            ColliderBuilder::cuboid(0.5, 0.5, 0.5).build(),
        );

        assert!(world.remove_body(handle));
        assert!(world.collider_set.get(collider).is_none());
        assert!(!world.remove_body(handle));
    }

    #[test]
    fn test_finite_bodies_report_none() {
        let mut world = PhysicsWorld::new();
        world.insert_body(
            RigidBodyBuilder::dynamic()
                .linvel(Vector::new(1.0, 2.0, 0.0))
                .build(),
            ColliderBuilder::ball(0.5).build(),
        );
        assert!(world.find_non_finite_body().is_none());
    }

    #[test]
    fn test_non_finite_body_detected() {
        let mut world = PhysicsWorld::new();
        let (handle, _) = world.insert_body(
            RigidBodyBuilder::dynamic().build(),
            ColliderBuilder::ball(0.5).build(),
        );
        world.rigid_body_set[handle].set_linvel(Vector::new(f32::NAN, 0.0, 0.0), true);
        assert_eq!(world.find_non_finite_body(), Some(handle));
    }

    #[test]
    fn test_rotation_conversion_preserves_components() {
        let q = Quat::from_rotation_z(0.7);
        let mut world = PhysicsWorld::new();
        let (handle, _) = world.insert_body(
            RigidBodyBuilder::dynamic().build(),
            ColliderBuilder::ball(0.5).build(),
        );
        world.rigid_body_set[handle].set_rotation(to_rapier_rotation(q), true);
        let back = body_rotation(&world.rigid_body_set[handle]);
        assert!((back.z - q.z).abs() < 1e-6);
        assert!((back.w - q.w).abs() < 1e-6);
    }
}
