//! The player state machine.
//!
//! [`PlayerController`] owns every piece of player state that is not Rapier's:
//! stance, held intents, jump charge and the damage outbox. It touches the
//! body at four well-defined points per tick:
//!
//! 1. [`PlayerController::pre_step`] before each physics step: refresh the
//!    grounded flag, update the automatic stance, fire intent pulses.
//! 2. [`PlayerController::on_contact`] after each step, once per new floor
//!    contact.
//! 3. [`PlayerController::settle`] from the player's registry hook in the
//!    mirror pass.
//! 4. The input actions, between frames.

use glam::{Quat, Vec3};
use rapier3d::prelude::*;
use tracing::{debug, trace};
use tumble_config::PlayerConfig;
use tumble_physics::{
    ContactClass, ContactEvent, GroundIndex, PhysicsWorld, body_angvel, body_linvel,
    body_rotation, body_translation, planar_body, project_rotation, to_rapier,
    to_rapier_rotation,
};

use crate::damage::{DamageEvent, assess_impact};
use crate::grounded::is_grounded;
use crate::intent::{AngularIntent, Direction, HorizontalIntent, decay_toward_zero, push_toward_cap};
use crate::jump::{ChargeLevel, charge_level, jump_velocity};
use crate::stance::{Stance, VolumePreset};

/// Controller for the player body.
pub struct PlayerController {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    tuning: PlayerConfig,
    /// Simulated seconds since spawn, advanced by [`Self::pre_step`].
    now: f32,
    grounded: bool,
    facing: Direction,
    stance: Stance,
    /// Preset currently installed on the collider.
    volume: VolumePreset,
    horizontal: HorizontalIntent,
    angular: AngularIntent,
    brake_modifier: bool,
    tilt_release_at: Option<f32>,
    charge_started_at: Option<f32>,
    last_floor_contact: Option<f32>,
    damage: Vec<DamageEvent>,
}

impl PlayerController {
    /// Creates the player body at `position` and a controller for it.
    pub fn spawn(world: &mut PhysicsWorld, position: Vec3, tuning: PlayerConfig) -> Self {
        let volume = VolumePreset::UPRIGHT;
        let h = volume.half_extents;
        let body = planar_body(RigidBodyBuilder::dynamic())
            .translation(to_rapier(position))
            .can_sleep(false)
            .build();
        let collider = ColliderBuilder::cuboid(h.x, h.y, h.z)
            .friction(tuning.friction)
            .mass(tuning.mass)
            .build();
        let (body, collider) = world.insert_body(body, collider);
        debug!("Spawned player body {body:?} at {position}");

        Self {
            body,
            collider,
            tuning,
            now: 0.0,
            grounded: false,
            facing: Direction::Right,
            stance: Stance::Upright,
            volume,
            horizontal: HorizontalIntent::Idle,
            angular: AngularIntent::Idle,
            brake_modifier: false,
            tilt_release_at: None,
            charge_started_at: None,
            last_floor_contact: None,
            damage: Vec::new(),
        }
    }

    /// Swaps in new tuning, updating the collider's friction and mass.
    ///
    /// Intents in flight keep running under the new values.
    pub fn retune(&mut self, world: &mut PhysicsWorld, tuning: PlayerConfig) {
        if let Some(collider) = world.collider_set.get_mut(self.collider) {
            collider.set_friction(tuning.friction);
            collider.set_mass(tuning.mass);
        }
        debug!("Player retuned: jump {} move {}", tuning.jump_strength, tuning.move_step);
        self.tuning = tuning;
    }

    // -- accessors -----------------------------------------------------------

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn tuning(&self) -> &PlayerConfig {
        &self.tuning
    }

    /// Controller clock in seconds.
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Grounded flag cached by the last [`Self::refresh_grounded`].
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    /// Preset installed on the collider right now.
    pub fn volume(&self) -> VolumePreset {
        self.volume
    }

    pub fn horizontal_intent(&self) -> HorizontalIntent {
        self.horizontal
    }

    pub fn angular_intent(&self) -> AngularIntent {
        self.angular
    }

    pub fn is_righting(&self) -> bool {
        self.angular.is_righting()
    }

    /// Clock time of the last floor contact. Bookkeeping only.
    pub fn last_floor_contact(&self) -> Option<f32> {
        self.last_floor_contact
    }

    /// Clock time the current jump charge began, if one is in progress.
    pub fn charge_started_at(&self) -> Option<f32> {
        self.charge_started_at
    }

    /// Progress of the jump charge in progress.
    pub fn charge_level(&self) -> Option<ChargeLevel> {
        self.charge_started_at
            .map(|start| charge_level(self.now - start, &self.tuning))
    }

    /// Damage events queued since the last drain.
    pub fn pending_damage(&self) -> &[DamageEvent] {
        &self.damage
    }

    /// Takes all queued damage events.
    pub fn drain_damage(&mut self) -> Vec<DamageEvent> {
        std::mem::take(&mut self.damage)
    }

    // -- input actions -------------------------------------------------------

    /// Starts pushing in `dir`. Repeated calls while held are no-ops.
    pub fn start_move(&mut self, dir: Direction) {
        if self.horizontal.held_direction() == Some(dir) {
            return;
        }
        trace!("Move {dir:?} (was {:?})", self.horizontal);
        self.horizontal = HorizontalIntent::moving(dir);
        self.facing = dir;
    }

    /// Stops pushing in `dir`. Velocity is left alone.
    pub fn stop_move(&mut self, dir: Direction) {
        if self.horizontal.held_direction() == Some(dir) {
            self.horizontal = HorizontalIntent::Idle;
        }
    }

    /// Marks the start of a jump charge and returns its start time.
    pub fn begin_jump_charge(&mut self) -> f32 {
        *self.charge_started_at.get_or_insert(self.now)
    }

    /// Jumps with strength set by the time since `charge_start`.
    ///
    /// Does nothing unless grounded. Returns whether the jump happened.
    pub fn jump(&mut self, world: &mut PhysicsWorld, charge_start: f32) -> bool {
        self.charge_started_at = None;
        if !self.grounded {
            trace!("Jump ignored: airborne");
            return false;
        }
        let Some(body) = world.rigid_body_set.get_mut(self.body) else {
            return false;
        };

        let held = self.now - charge_start;
        let vy = jump_velocity(held, &self.tuning);
        let v = body_linvel(body);
        body.set_linvel(to_rapier(Vec3::new(v.x, vy, 0.0)), true);
        self.tilt_release_at = Some(self.now + self.tuning.tilt_release_delay);
        debug!("Jump: held {held:.3}s -> vy {vy:.2}");
        true
    }

    /// Catches spin in the air, or brakes on the ground.
    pub fn stop_spin(&mut self, world: &mut PhysicsWorld) {
        if self.grounded {
            if !self.horizontal.is_braking() {
                trace!("Brake started");
                self.horizontal = HorizontalIntent::braking();
            }
            return;
        }

        if let Some(body) = world.rigid_body_set.get_mut(self.body) {
            body.set_angvel(to_rapier(Vec3::ZERO), true);
        }
        if self.angular.is_righting() {
            self.angular = AngularIntent::Idle;
        }
        if self.stance.is_tumbling() {
            self.set_stance(Stance::Upright);
        }
        self.sync_volume(world);
    }

    /// Holds or releases the brake modifier.
    pub fn set_brake_modifier(&mut self, held: bool) {
        self.brake_modifier = held;
    }

    // -- per-tick ------------------------------------------------------------

    /// Re-probes the ground and caches the result.
    pub fn refresh_grounded(&mut self, world: &PhysicsWorld, ground: &GroundIndex) -> bool {
        self.grounded = is_grounded(
            world,
            self.body,
            self.stance,
            ground,
            self.tuning.ground_probe_range,
        );
        self.grounded
    }

    /// Runs before each physics step.
    pub fn pre_step(&mut self, world: &mut PhysicsWorld, ground: &GroundIndex, dt: f32) {
        self.now += dt;

        if let Some(at) = self.tilt_release_at
            && self.now >= at
        {
            self.tilt_release_at = None;
            if self.stance.is_tilted() {
                self.set_stance(Stance::Upright);
            }
        }

        self.sync_volume(world);
        self.refresh_grounded(world, ground);

        let Some(body) = world.rigid_body_set.get_mut(self.body) else {
            return;
        };
        self.update_airborne_stance(body);
        self.apply_horizontal(body, dt);
        self.apply_angular(body, dt);

        self.sync_volume(world);
    }

    /// Reacts to a newly started contact.
    ///
    /// Only floor-like contacts matter; walls and ceilings are ignored.
    pub fn on_contact(&mut self, world: &mut PhysicsWorld, event: &ContactEvent, class: &ContactClass) {
        if !class.is_floor_like {
            return;
        }
        let Some(body) = world.rigid_body_set.get_mut(self.body) else {
            return;
        };
        self.last_floor_contact = Some(self.now);

        if class.is_ground {
            if class.platform_angle != 0.0 {
                self.set_stance(Stance::Tilted {
                    angle: class.platform_angle,
                });
            } else if self.stance.is_tilted() {
                self.set_stance(Stance::Upright);
            }
        }

        let rotation = body_rotation(body);
        let tilt = relative_tilt(rotation, class.platform_angle);
        let excess_tilt = tilt.abs() > self.tuning.tilt_tolerance;
        let v = event.impact_linvel;
        let wz = event.impact_angvel.z;

        if excess_tilt {
            if !self.angular.is_righting() {
                let dir = if wz.abs() >= v.x.abs() {
                    wz.signum()
                } else {
                    -v.x.signum()
                };
                if v.y.abs() > self.tuning.damage_speed_low && !self.stance.is_tilted() {
                    self.set_stance(Stance::Tumbling);
                }
                debug!("Landed tipped (tilt {tilt:.2}); righting toward {dir:+}");
                self.angular = AngularIntent::righting(dir, rotation.z);
            }
        } else {
            if self.stance.is_tumbling() {
                self.set_stance(Stance::Upright);
            }
            if class.platform_angle == 0.0 && !self.angular.is_righting() {
                self.angular = AngularIntent::levelling(rotation);
            }
        }

        if let Some((cause, impact_speed)) = assess_impact(v.x, v.y, excess_tilt, &self.tuning) {
            debug!("Damage {cause:?} at {impact_speed:.1} m/s");
            self.damage.push(DamageEvent {
                cause,
                impact_speed,
                tilt,
                at: self.now,
            });
        }

        self.sync_volume(world);
    }

    /// Post-step cleanup, run from the mirror pass.
    pub fn settle(&mut self, body: &mut RigidBody) {
        let eps = self.tuning.settle_epsilon;
        let mut v = body_linvel(body);
        let mut w = body_angvel(body);

        if self.grounded {
            let mut changed = false;
            if v.y != 0.0 && v.y.abs() < eps {
                v.y = 0.0;
                changed = true;
            }
            if w.z != 0.0 && w.z.abs() < eps {
                w.z = 0.0;
                changed = true;
            }
            if changed {
                body.set_linvel(to_rapier(v), false);
                body.set_angvel(to_rapier(w), false);
            }
        }

        if w.z.abs() > self.tuning.runaway_spin && self.stance.is_tilted() {
            debug!("Runaway spin {:.1} rad/s; dropping tilt stance", w.z);
            self.set_stance(Stance::Upright);
        }
    }

    /// Puts the player back at `position` with all state cleared.
    pub fn respawn(&mut self, world: &mut PhysicsWorld, position: Vec3) {
        if let Some(body) = world.rigid_body_set.get_mut(self.body) {
            body.set_translation(to_rapier(position), true);
            body.set_rotation(to_rapier_rotation(Quat::IDENTITY), true);
            body.set_linvel(to_rapier(Vec3::ZERO), true);
            body.set_angvel(to_rapier(Vec3::ZERO), true);
        }
        self.horizontal = HorizontalIntent::Idle;
        self.angular = AngularIntent::Idle;
        self.tilt_release_at = None;
        self.charge_started_at = None;
        self.grounded = false;
        self.set_stance(Stance::Upright);
        self.sync_volume(world);
        debug!("Player respawned at {position}");
    }

    /// Body position, if the body still exists.
    pub fn position(&self, world: &PhysicsWorld) -> Option<Vec3> {
        world.rigid_body_set.get(self.body).map(body_translation)
    }

    // -- internals -----------------------------------------------------------

    fn set_stance(&mut self, stance: Stance) {
        if self.stance != stance {
            debug!("Stance {} -> {}", self.stance, stance);
            self.stance = stance;
        }
    }

    /// Installs the current stance's preset on the collider if it differs.
    fn sync_volume(&mut self, world: &mut PhysicsWorld) {
        let preset = self.stance.preset();
        if preset == self.volume {
            return;
        }
        if let Some(collider) = world.collider_set.get_mut(self.collider) {
            let h = preset.half_extents;
            collider.set_shape(SharedShape::cuboid(h.x, h.y, h.z));
        }
        self.volume = preset;
    }

    fn update_airborne_stance(&mut self, body: &RigidBody) {
        if self.grounded || self.stance.is_tilted() {
            return;
        }
        let spin = body_angvel(body).z.abs();
        if spin > self.tuning.tumble_enter_spin {
            self.set_stance(Stance::Tumbling);
        } else if spin < self.tuning.tumble_exit_spin && self.stance.is_tumbling() {
            self.set_stance(Stance::Upright);
        }
    }

    fn apply_horizontal(&mut self, body: &mut RigidBody, dt: f32) {
        let t = &self.tuning;
        let mut v = body_linvel(body);
        let mut w = body_angvel(body);
        let mut finished = false;

        match &mut self.horizontal {
            HorizontalIntent::Idle => return,
            HorizontalIntent::Move { dir, pulse } => {
                let pulses = pulse.advance(dt, t.pulse_period);
                if pulses == 0 {
                    return;
                }
                let sign = dir.sign();
                for _ in 0..pulses {
                    if !self.grounded {
                        v.x = push_toward_cap(v.x, sign, t.move_step * t.airborne_factor, t.max_speed);
                        w.z = push_toward_cap(w.z, -sign, t.airborne_spin_step, t.max_tumble_speed);
                    } else if self.brake_modifier {
                        v.x = decay_toward_zero(v.x, t.brake_step);
                    } else {
                        v.x = push_toward_cap(v.x, sign, t.move_step, t.max_speed);
                    }
                }
            }
            HorizontalIntent::Brake { elapsed, pulse } => {
                *elapsed += dt;
                for _ in 0..pulse.advance(dt, t.pulse_period) {
                    v.x = decay_toward_zero(v.x, t.brake_step);
                }
                finished = v.x == 0.0 || *elapsed >= t.brake_timeout;
            }
        }

        if finished {
            trace!("Brake finished");
            self.horizontal = HorizontalIntent::Idle;
        }
        body.set_linvel(to_rapier(v), true);
        body.set_angvel(to_rapier(w), true);
    }

    fn apply_angular(&mut self, body: &mut RigidBody, dt: f32) {
        let t = &self.tuning;
        match &mut self.angular {
            AngularIntent::Idle => {}
            AngularIntent::Righting {
                dir,
                start_sign,
                pulse,
            } => {
                let rotation_z = body_rotation(body).z;
                if rotation_z * *start_sign <= 0.0 {
                    body.set_angvel(to_rapier(Vec3::ZERO), true);
                    body.set_rotation(to_rapier_rotation(Quat::IDENTITY), true);
                    self.angular = AngularIntent::Idle;
                    debug!("Righting complete");
                    if self.stance.is_tumbling() {
                        self.set_stance(Stance::Upright);
                    }
                    return;
                }
                if pulse.advance(dt, t.pulse_period) > 0 {
                    let w = body_angvel(body);
                    body.set_angvel(to_rapier(Vec3::new(w.x, w.y, *dir * t.righting_speed)), true);
                }
            }
            AngularIntent::Levelling { from, elapsed } => {
                *elapsed += dt;
                let progress = if t.level_duration > 0.0 {
                    (*elapsed / t.level_duration).min(1.0)
                } else {
                    1.0
                };
                if progress >= 1.0 {
                    body.set_rotation(to_rapier_rotation(Quat::IDENTITY), true);
                    body.set_angvel(to_rapier(Vec3::ZERO), true);
                    self.angular = AngularIntent::Idle;
                } else {
                    let rotation = from.slerp(Quat::IDENTITY, progress);
                    body.set_rotation(to_rapier_rotation(rotation), true);
                }
            }
        }
    }
}

/// Quaternion z component of `rotation` measured from a surface inclined by
/// `platform_angle` radians.
pub fn relative_tilt(rotation: Quat, platform_angle: f32) -> f32 {
    let relative = Quat::from_rotation_z(platform_angle).inverse() * project_rotation(rotation);
    // q and -q are the same rotation; report the short way round.
    if relative.w < 0.0 { -relative.z } else { relative.z }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
