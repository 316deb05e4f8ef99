//! The 2.5D gameplay plane.
//!
//! The world is 3D, gameplay is not: planar bodies may translate in x/y and
//! rotate about z only. Rapier's axis locks keep the solver honest; the
//! mirror pass re-projects whatever drift survives via [`enforce_plane`].

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

use crate::{body_angvel, body_linvel, body_rotation, body_translation, to_rapier, to_rapier_rotation};

/// Drift below this is left alone so resting bodies are not woken.
const PLANE_DRIFT_EPSILON: f32 = 1e-6;

/// Restricts a body builder to the gameplay plane.
pub fn planar_body(builder: RigidBodyBuilder) -> RigidBodyBuilder {
    builder
        .enabled_translations(true, true, false)
        .enabled_rotations(false, false, true)
}

/// Zeroes the x/y quaternion components and renormalises.
///
/// A rotation that was entirely out of plane collapses to identity.
pub fn project_rotation(q: Quat) -> Quat {
    let projected = Quat::from_xyzw(0.0, 0.0, q.z, q.w);
    if projected.length_squared() <= f32::EPSILON {
        Quat::IDENTITY
    } else {
        projected.normalize()
    }
}

/// Signed rotation about z, in radians within `(-π, π]`.
pub fn tilt_angle(q: Quat) -> f32 {
    let projected = project_rotation(q);
    let angle = 2.0 * projected.z.atan2(projected.w);
    if angle > std::f32::consts::PI {
        angle - std::f32::consts::TAU
    } else if angle <= -std::f32::consts::PI {
        angle + std::f32::consts::TAU
    } else {
        angle
    }
}

/// Pins a body back onto the plane at depth `plane_z`.
///
/// Returns `true` if anything had drifted and was written back.
pub fn enforce_plane(body: &mut RigidBody, plane_z: f32) -> bool {
    let mut corrected = false;

    let t = body_translation(body);
    if (t.z - plane_z).abs() > PLANE_DRIFT_EPSILON {
        body.set_translation(to_rapier(Vec3::new(t.x, t.y, plane_z)), false);
        corrected = true;
    }

    let q = body_rotation(body);
    if q.x.abs() > PLANE_DRIFT_EPSILON || q.y.abs() > PLANE_DRIFT_EPSILON {
        body.set_rotation(to_rapier_rotation(project_rotation(q)), false);
        corrected = true;
    }

    let v = body_linvel(body);
    if v.z.abs() > PLANE_DRIFT_EPSILON {
        body.set_linvel(to_rapier(Vec3::new(v.x, v.y, 0.0)), false);
        corrected = true;
    }

    let w = body_angvel(body);
    if w.x.abs() > PLANE_DRIFT_EPSILON || w.y.abs() > PLANE_DRIFT_EPSILON {
        body.set_angvel(to_rapier(Vec3::new(0.0, 0.0, w.z)), false);
        corrected = true;
    }

    corrected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_rotation_keeps_z_roll() {
        let q = Quat::from_rotation_z(0.5);
        let projected = project_rotation(q);
        assert!(projected.abs_diff_eq(q, 1e-6));
    }

    #[test]
    fn test_project_rotation_strips_out_of_plane() {
        let q = Quat::from_rotation_z(0.5) * Quat::from_rotation_x(0.2);
        let projected = project_rotation(q);
        assert_eq!(projected.x, 0.0);
        assert_eq!(projected.y, 0.0);
        assert!((projected.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_project_pure_out_of_plane_is_identity() {
        let q = Quat::from_rotation_x(std::f32::consts::PI);
        assert_eq!(project_rotation(q), Quat::IDENTITY);
    }

    #[test]
    fn test_tilt_angle_signed() {
        assert!((tilt_angle(Quat::from_rotation_z(0.4)) - 0.4).abs() < 1e-5);
        assert!((tilt_angle(Quat::from_rotation_z(-1.2)) + 1.2).abs() < 1e-5);
        assert!(tilt_angle(Quat::IDENTITY).abs() < 1e-6);
    }

    #[test]
    fn test_enforce_plane_corrects_drift() {
        let mut body = RigidBodyBuilder::dynamic()
            .translation(Vector::new(1.0, 2.0, 0.3))
            .linvel(Vector::new(1.0, 0.0, 0.5))
            .build();
        assert!(enforce_plane(&mut body, 0.0));

        let t = body_translation(&body);
        assert_eq!(t.z, 0.0);
        assert_eq!(t.x, 1.0);
        assert_eq!(body_linvel(&body).z, 0.0);
        assert!(!enforce_plane(&mut body, 0.0));
    }

    #[test]
    fn test_planar_body_locks_axes() {
        let mut body = planar_body(RigidBodyBuilder::dynamic()).build();
        assert!(!enforce_plane(&mut body, 0.0));
        assert!(body.is_dynamic());
    }
}
