//! Side-on camera that follows the player.

use glam::{Mat3, Mat4, Quat, Vec3};
use tumble_config::CameraConfig;

/// Camera pose plus follow settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    /// World position of the camera.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Orientation facing `target`.
    pub rotation: Quat,
    /// Offset from the target to the desired camera position.
    pub offset: Vec3,
    /// Interpolation factor per follow (0.0 = stay, 1.0 = snap).
    pub follow_lerp: f32,
    /// Follow the target every frame.
    pub locked: bool,
}

impl CameraRig {
    /// Creates a rig already in place around `target`.
    pub fn new(config: &CameraConfig, target: Vec3) -> Self {
        let offset = Vec3::from_array(config.offset);
        let mut rig = Self {
            position: target + offset,
            target,
            rotation: Quat::IDENTITY,
            offset,
            follow_lerp: config.follow_lerp.clamp(0.0, 1.0),
            locked: config.lock_camera,
        };
        rig.look_at(target);
        rig
    }

    /// Moves toward `target + offset` and turns to face `target`.
    ///
    /// Does nothing while unlocked.
    pub fn follow(&mut self, target: Vec3) {
        if !self.locked || !target.is_finite() {
            return;
        }
        let desired = target + self.offset;
        self.position = self.position.lerp(desired, self.follow_lerp);
        self.look_at(target);
    }

    /// Snaps straight onto `target`, ignoring smoothing and the lock.
    pub fn snap_to(&mut self, target: Vec3) {
        self.position = target + self.offset;
        self.look_at(target);
    }

    /// Right-handed view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    fn look_at(&mut self, target: Vec3) {
        self.target = target;
        let to_target = target - self.position;
        if to_target.length_squared() > 1e-6 {
            // Camera looks down its local -Z.
            let back = -to_target.normalize();
            let right = Vec3::Y.cross(back).normalize_or_zero();
            let up = back.cross(right);
            self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, back));
        }
    }
}
