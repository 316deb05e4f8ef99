use tumble_physics::{FIXED_DT, GroundSurface, classify};

use super::*;
use crate::damage::DamageCause;

const FLOOR_TOP: f32 = 0.1;

struct Rig {
    world: PhysicsWorld,
    ground: GroundIndex,
    floor: ColliderHandle,
    player: PlayerController,
}

impl Rig {
    fn new(player_y: f32) -> Self {
        let mut world = PhysicsWorld::new();
        let mut ground = GroundIndex::new();
        let (_, floor) = world.insert_body(
            RigidBodyBuilder::fixed().build(),
            ColliderBuilder::cuboid(50.0, FLOOR_TOP, 1.0).friction(0.3).build(),
        );
        ground.insert(floor, GroundSurface { angle: 0.0 });
        let player = PlayerController::spawn(
            &mut world,
            Vec3::new(0.0, player_y, 0.0),
            PlayerConfig::default(),
        );
        world.step();
        Self {
            world,
            ground,
            floor,
            player,
        }
    }

    /// Player resting on the floor.
    fn grounded() -> Self {
        let mut rig = Self::new(FLOOR_TOP + 0.51);
        rig.ticks(30);
        assert!(rig.player.is_grounded(), "player should rest on the floor");
        rig
    }

    /// Player far above the floor.
    fn airborne() -> Self {
        let mut rig = Self::new(80.0);
        rig.tick();
        assert!(!rig.player.is_grounded());
        rig
    }

    fn tick(&mut self) {
        self.player.pre_step(&mut self.world, &self.ground, FIXED_DT);
        self.world.step();
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    fn body(&mut self) -> &mut RigidBody {
        &mut self.world.rigid_body_set[self.player.body()]
    }

    fn linvel(&self) -> Vec3 {
        body_linvel(&self.world.rigid_body_set[self.player.body()])
    }

    fn angvel(&self) -> Vec3 {
        body_angvel(&self.world.rigid_body_set[self.player.body()])
    }

    fn rotation(&self) -> Quat {
        body_rotation(&self.world.rigid_body_set[self.player.body()])
    }

    /// Feeds a floor landing with the given impact velocities.
    fn land(&mut self, impact_linvel: Vec3, impact_angvel: Vec3, angle: f32) {
        self.ground.insert(self.floor, GroundSurface { angle });
        let event = ContactEvent {
            collider1: self.floor,
            collider2: self.player.collider(),
            normal: Vec3::Y,
            impact_linvel,
            impact_angvel,
        };
        let class = classify(&event, self.player.collider(), &self.ground);
        self.player.on_contact(&mut self.world, &event, &class);
    }
}

// -- movement ----------------------------------------------------------------

#[test]
fn test_move_then_stop_leaves_no_residual_push() {
    let mut rig = Rig::grounded();
    rig.player.start_move(Direction::Right);
    rig.ticks(10);
    let moving = rig.linvel().x;
    assert!(moving > 1.0, "vx={moving}");

    rig.player.stop_move(Direction::Right);
    let mut last = moving;
    for _ in 0..10 {
        rig.tick();
        let vx = rig.linvel().x;
        assert!(vx <= last + 1e-4, "vx rose after release: {last} -> {vx}");
        last = vx;
    }
}

#[test]
fn test_move_and_immediate_stop_applies_nothing() {
    let mut rig = Rig::grounded();
    for dir in [Direction::Left, Direction::Right] {
        rig.player.start_move(dir);
        rig.player.stop_move(dir);
        rig.ticks(5);
        assert!(rig.linvel().x.abs() < 1e-3, "vx={}", rig.linvel().x);
    }
}

#[test]
fn test_repeat_press_keeps_accumulator() {
    let mut rig = Rig::grounded();
    rig.player.start_move(Direction::Right);
    rig.tick();
    rig.player.start_move(Direction::Right);
    let HorizontalIntent::Move { pulse, .. } = rig.player.horizontal_intent() else {
        panic!("expected move intent");
    };
    assert!(pulse.accumulated() > 0.0);
}

#[test]
fn test_opposite_direction_replaces_intent() {
    let mut rig = Rig::grounded();
    rig.player.start_move(Direction::Right);
    rig.player.start_move(Direction::Left);
    assert_eq!(rig.player.horizontal_intent().held_direction(), Some(Direction::Left));
    assert_eq!(rig.player.facing(), Direction::Left);

    // Releasing the key that is no longer active changes nothing.
    rig.player.stop_move(Direction::Right);
    assert_eq!(rig.player.horizontal_intent().held_direction(), Some(Direction::Left));
}

#[test]
fn test_speed_is_capped() {
    let mut rig = Rig::grounded();
    rig.player.start_move(Direction::Left);
    rig.ticks(180);
    let vx = rig.linvel().x;
    assert!(vx >= -rig.player.tuning().max_speed - 1e-3, "vx={vx}");
    assert!(vx < -4.0, "vx={vx}");
}

#[test]
fn test_move_keeps_speed_above_cap() {
    let mut rig = Rig::grounded();
    let fast = rig.player.tuning().max_speed + 3.0;
    rig.body().set_linvel(Vector::new(fast, 0.0, 0.0), true);
    rig.player.start_move(Direction::Right);
    rig.ticks(3);
    let vx = rig.linvel().x;
    // Friction may shave a little off, but nothing pulls it back to the cap.
    assert!(vx > rig.player.tuning().max_speed + 2.0, "vx={vx}");
}

#[test]
fn test_airborne_move_rolls_with_travel() {
    let mut rig = Rig::airborne();
    rig.player.start_move(Direction::Right);
    rig.ticks(6);
    let v = rig.linvel();
    let w = rig.angvel();
    assert!(v.x > 0.0);
    // Far below the grounded increment for the same number of pulses.
    assert!(v.x < 5.0 * rig.player.tuning().move_step);
    assert!(w.z < 0.0, "rolling right spins clockwise: wz={}", w.z);
}

#[test]
fn test_brake_modifier_slows_instead_of_pushing() {
    let mut rig = Rig::grounded();
    rig.body().set_linvel(Vector::new(3.0, 0.0, 0.0), true);
    rig.player.set_brake_modifier(true);
    rig.player.start_move(Direction::Right);
    rig.ticks(10);
    let vx = rig.linvel().x;
    assert!(vx < 3.0 && vx >= 0.0, "vx={vx}");
}

// -- jump --------------------------------------------------------------------

#[test]
fn test_jump_minimum_at_floor_charge() {
    let mut rig = Rig::grounded();
    let start = rig.player.now() - 0.17;
    assert!(rig.player.jump(&mut rig.world, start));
    let expected = rig.player.tuning().min_jump_velocity();
    assert!((rig.linvel().y - expected).abs() < 1e-4, "vy={}", rig.linvel().y);
}

#[test]
fn test_jump_saturates() {
    let mut rig = Rig::grounded();
    let start = rig.player.now() - 3.0;
    assert!(rig.player.jump(&mut rig.world, start));
    assert!((rig.linvel().y - rig.player.tuning().jump_strength).abs() < 1e-4);
}

#[test]
fn test_jump_airborne_is_noop() {
    let mut rig = Rig::airborne();
    let before = rig.linvel();
    let start = rig.player.begin_jump_charge();
    assert!(!rig.player.jump(&mut rig.world, start));
    assert_eq!(rig.linvel(), before);
    assert!(rig.player.charge_started_at().is_none());
}

#[test]
fn test_begin_charge_keeps_first_start() {
    let mut rig = Rig::grounded();
    let first = rig.player.begin_jump_charge();
    rig.tick();
    assert_eq!(rig.player.begin_jump_charge(), first);
    rig.ticks(30);
    assert_eq!(rig.player.charge_level(), Some(ChargeLevel::Full));
}

#[test]
fn test_jump_releases_tilt_after_delay() {
    let mut rig = Rig::grounded();
    rig.player.stance = Stance::Tilted { angle: 0.3 };
    let start = rig.player.now();
    rig.player.jump(&mut rig.world, start);
    rig.tick();
    assert!(rig.player.stance().is_tilted());
    rig.ticks(10);
    assert_eq!(rig.player.stance(), Stance::Upright);
}

// -- stop_spin ---------------------------------------------------------------

#[test]
fn test_stop_spin_airborne_idempotent() {
    let mut rig = Rig::airborne();
    rig.body().set_angvel(Vector::new(0.0, 0.0, 9.0), true);
    rig.tick();
    assert!(rig.player.stance().is_tumbling());

    rig.player.stop_spin(&mut rig.world);
    let once = (rig.player.stance(), rig.angvel(), rig.player.angular_intent(), rig.player.volume());
    rig.player.stop_spin(&mut rig.world);
    let twice = (rig.player.stance(), rig.angvel(), rig.player.angular_intent(), rig.player.volume());

    assert_eq!(once, twice);
    assert_eq!(once.0, Stance::Upright);
    assert_eq!(once.1, Vec3::ZERO);
    assert_eq!(once.3, VolumePreset::UPRIGHT);
}

#[test]
fn test_stop_spin_grounded_brakes_to_rest() {
    let mut rig = Rig::grounded();
    rig.body().set_linvel(Vector::new(3.0, 0.0, 0.0), true);
    rig.player.stop_spin(&mut rig.world);
    assert!(rig.player.horizontal_intent().is_braking());

    rig.ticks(40);
    assert_eq!(rig.player.horizontal_intent(), HorizontalIntent::Idle);
    assert!(rig.linvel().x.abs() < 0.05, "vx={}", rig.linvel().x);
}

#[test]
fn test_brake_times_out() {
    let mut rig = Rig::grounded();
    rig.player.stop_spin(&mut rig.world);
    // Keep the body moving faster than the brake can cancel.
    for _ in 0..70 {
        rig.body().set_linvel(Vector::new(20.0, 0.0, 0.0), true);
        rig.tick();
    }
    assert_eq!(rig.player.horizontal_intent(), HorizontalIntent::Idle);
}

// -- stances -----------------------------------------------------------------

#[test]
fn test_high_spin_enters_and_leaves_tumbling() {
    let mut rig = Rig::airborne();
    rig.body().set_angvel(Vector::new(0.0, 0.0, 8.0), true);
    rig.tick();
    assert!(rig.player.stance().is_tumbling());
    assert_eq!(rig.player.volume(), VolumePreset::TUMBLING);
    let shape = rig.world.collider_set[rig.player.collider()].shape();
    let half_y = shape.as_cuboid().map(|c| c.half_extents.y);
    assert_eq!(half_y, Some(0.38));

    rig.body().set_angvel(Vector::new(0.0, 0.0, 1.0), true);
    rig.tick();
    assert_eq!(rig.player.stance(), Stance::Upright);
}

#[test]
fn test_tilted_never_tumbles() {
    let mut rig = Rig::airborne();
    rig.player.stance = Stance::Tilted { angle: 0.3 };
    for _ in 0..10 {
        rig.body().set_angvel(Vector::new(0.0, 0.0, 10.0), true);
        rig.tick();
        assert!(!rig.player.stance().is_tumbling());
    }
    assert!(rig.player.stance().is_tilted());
}

#[test]
fn test_inclined_landing_tilts_and_level_landing_clears() {
    let mut rig = Rig::airborne();
    rig.land(Vec3::new(0.0, -3.0, 0.0), Vec3::ZERO, 0.3);
    assert_eq!(rig.player.stance(), Stance::Tilted { angle: 0.3 });
    assert_eq!(rig.player.volume(), VolumePreset::TILTED);
    // No levelling on an incline.
    assert!(!rig.player.angular_intent().is_levelling());

    rig.land(Vec3::new(0.0, -3.0, 0.0), Vec3::ZERO, 0.0);
    assert_eq!(rig.player.stance(), Stance::Upright);
}

#[test]
fn test_wall_contact_ignored() {
    let mut rig = Rig::airborne();
    let event = ContactEvent {
        collider1: rig.floor,
        collider2: rig.player.collider(),
        normal: Vec3::X,
        impact_linvel: Vec3::new(20.0, 0.0, 0.0),
        impact_angvel: Vec3::ZERO,
    };
    let class = classify(&event, rig.player.collider(), &rig.ground);
    rig.player.on_contact(&mut rig.world, &event, &class);
    assert!(rig.player.last_floor_contact().is_none());
    assert!(rig.player.pending_damage().is_empty());
}

// -- landings ----------------------------------------------------------------

#[test]
fn test_hard_upright_landing_damages_and_levels() {
    let mut rig = Rig::airborne();
    rig.player.stance = Stance::Tumbling;
    rig.body().set_rotation(to_rapier_rotation(Quat::from_rotation_z(0.2)), true);

    rig.land(Vec3::new(0.0, -13.0, 0.0), Vec3::ZERO, 0.0);

    let damage = rig.player.drain_damage();
    assert_eq!(damage.len(), 1);
    assert_eq!(damage[0].cause, DamageCause::HardImpact);
    assert_eq!(rig.player.stance(), Stance::Upright);
    assert!(!rig.player.is_righting());
    assert!(rig.player.angular_intent().is_levelling());

    rig.ticks(10);
    assert_eq!(rig.player.angular_intent(), AngularIntent::Idle);
    assert!(relative_tilt(rig.rotation(), 0.0).abs() < 1e-4);
    assert!(!rig.player.is_righting());
}

#[test]
fn test_tipped_landing_forces_tumbling_and_damage() {
    let mut rig = Rig::airborne();
    rig.body().set_rotation(to_rapier_rotation(Quat::from_rotation_z(1.2)), true);

    rig.land(Vec3::new(2.0, -9.0, 0.0), Vec3::new(0.0, 0.0, 1.0), 0.0);

    assert!(rig.player.is_righting());
    assert_eq!(rig.player.stance(), Stance::Tumbling);
    let damage = rig.player.drain_damage();
    assert_eq!(damage.len(), 1);
    assert_eq!(damage[0].cause, DamageCause::TippedImpact);
    // Horizontal speed dominated: roll with travel, i.e. clockwise.
    let AngularIntent::Righting { dir, .. } = rig.player.angular_intent() else {
        panic!("expected righting");
    };
    assert_eq!(dir, -1.0);
}

#[test]
fn test_righting_follows_spin_and_stops_at_neutral() {
    let mut rig = Rig::airborne();
    rig.body().set_rotation(to_rapier_rotation(Quat::from_rotation_z(-0.8)), true);

    rig.land(Vec3::new(-1.0, -2.0, 0.0), Vec3::new(0.0, 0.0, 3.0), 0.0);
    let AngularIntent::Righting { dir, start_sign, .. } = rig.player.angular_intent() else {
        panic!("expected righting");
    };
    assert_eq!(dir, 1.0);
    assert_eq!(start_sign, -1.0);

    let mut finished_after = None;
    for i in 0..60 {
        rig.player.pre_step(&mut rig.world, &rig.ground, FIXED_DT);
        if !rig.player.is_righting() {
            finished_after = Some(i);
            assert_eq!(rig.angvel(), Vec3::ZERO);
            assert_eq!(rig.rotation(), Quat::IDENTITY);
            break;
        }
        assert!(rig.angvel().z > 0.0 || i == 0);
        rig.world.step();
    }
    assert!(finished_after.is_some(), "righting never finished");
}

#[test]
fn test_second_righting_is_noop() {
    let mut rig = Rig::airborne();
    rig.body().set_rotation(to_rapier_rotation(Quat::from_rotation_z(1.0)), true);
    rig.land(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0), 0.0);
    let first = rig.player.angular_intent();

    rig.land(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0), 0.0);
    assert_eq!(rig.player.angular_intent(), first);
}

#[test]
fn test_tilt_measured_against_platform() {
    let rotation = Quat::from_rotation_z(0.6);
    assert!(relative_tilt(rotation, 0.0) > 0.29);
    assert!(relative_tilt(rotation, 0.6).abs() < 1e-6);
    assert!((relative_tilt(-Quat::from_rotation_z(0.4), 0.0) - 0.2f32.sin()).abs() < 1e-6);
}

// -- settle & respawn --------------------------------------------------------

#[test]
fn test_settle_zeroes_small_residuals_when_grounded() {
    let mut rig = Rig::grounded();
    rig.body().set_linvel(Vector::new(1.0, 0.02, 0.0), false);
    rig.body().set_angvel(Vector::new(0.0, 0.0, -0.03), false);
    let body = &mut rig.world.rigid_body_set[rig.player.body()];
    rig.player.settle(body);
    assert_eq!(rig.linvel(), Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(rig.angvel().z, 0.0);
}

#[test]
fn test_settle_leaves_airborne_body_alone() {
    let mut rig = Rig::airborne();
    rig.body().set_angvel(Vector::new(0.0, 0.0, 0.01), false);
    let body = &mut rig.world.rigid_body_set[rig.player.body()];
    rig.player.settle(body);
    assert_eq!(rig.angvel().z, 0.01);
}

#[test]
fn test_runaway_spin_clears_tilt() {
    let mut rig = Rig::airborne();
    rig.player.stance = Stance::Tilted { angle: -0.3 };
    rig.body().set_angvel(Vector::new(0.0, 0.0, 16.0), false);
    let body = &mut rig.world.rigid_body_set[rig.player.body()];
    rig.player.settle(body);
    assert_eq!(rig.player.stance(), Stance::Upright);
    // The collider follows on the next tick.
    rig.tick();
    assert_eq!(rig.player.volume(), VolumePreset::UPRIGHT);
}

#[test]
fn test_respawn_resets_everything() {
    let mut rig = Rig::airborne();
    rig.player.start_move(Direction::Left);
    rig.body().set_rotation(to_rapier_rotation(Quat::from_rotation_z(1.0)), true);
    rig.land(Vec3::new(0.0, -9.0, 0.0), Vec3::new(0.0, 0.0, 5.0), 0.0);
    rig.player.begin_jump_charge();
    assert!(rig.player.is_righting());

    let spawn = Vec3::new(0.0, 8.0, 0.0);
    rig.player.respawn(&mut rig.world, spawn);

    assert_eq!(rig.player.position(&rig.world), Some(spawn));
    assert_eq!(rig.linvel(), Vec3::ZERO);
    assert_eq!(rig.angvel(), Vec3::ZERO);
    assert_eq!(rig.rotation(), Quat::IDENTITY);
    assert_eq!(rig.player.stance(), Stance::Upright);
    assert_eq!(rig.player.volume(), VolumePreset::UPRIGHT);
    assert_eq!(rig.player.horizontal_intent(), HorizontalIntent::Idle);
    assert_eq!(rig.player.angular_intent(), AngularIntent::Idle);
    assert!(rig.player.charge_started_at().is_none());
}

#[test]
fn test_stale_body_actions_are_noops() {
    let mut rig = Rig::grounded();
    let body = rig.player.body();
    rig.world.remove_body(body);
    rig.player.stop_spin(&mut rig.world);
    rig.tick();
    assert!(!rig.player.is_grounded());
    assert!(!rig.player.jump(&mut rig.world, 0.0));
    assert!(rig.player.position(&rig.world).is_none());
}
