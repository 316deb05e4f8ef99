//! Fixed-timestep driver for [`PhysicsWorld`].
//!
//! Frames arrive at whatever rate the host manages; physics always advances
//! in whole `dt` increments. Leftover time carries into the next frame, and at
//! most `max_substeps` steps run per frame so a long stall cannot snowball.

use tracing::{error, warn};

use crate::PhysicsWorld;

/// Where a step callback is invoked relative to the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// Immediately before [`PhysicsWorld::step`].
    Before,
    /// Immediately after [`PhysicsWorld::step`].
    After,
}

/// What one call to [`PhysicsStepper::advance`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Fixed steps executed this frame.
    pub steps: u32,
    /// Time dropped because the substep cap was hit, in seconds.
    pub dropped: f32,
    /// Whether the stepper is halted after this frame.
    pub halted: bool,
}

/// Accumulates frame time and runs whole fixed steps.
#[derive(Debug, Clone)]
pub struct PhysicsStepper {
    accumulator: f32,
    max_substeps: u32,
    halted: bool,
}

impl PhysicsStepper {
    /// Creates a stepper running at most `max_substeps` (min 1) steps per frame.
    pub fn new(max_substeps: u32) -> Self {
        Self {
            accumulator: 0.0,
            max_substeps: max_substeps.max(1),
            halted: false,
        }
    }

    /// Steps cap per frame.
    pub fn max_substeps(&self) -> u32 {
        self.max_substeps
    }

    /// Time carried over to the next frame, in seconds.
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Whether a non-finite body has stopped the simulation.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Advances physics by `frame_dt` seconds of wall time.
    ///
    /// `on_step` runs around every fixed step with the matching [`StepPhase`].
    /// After each step the world is scanned for non-finite dynamic bodies;
    /// finding one halts the stepper for good.
    pub fn advance<F>(&mut self, world: &mut PhysicsWorld, frame_dt: f32, mut on_step: F) -> StepReport
    where
        F: FnMut(&mut PhysicsWorld, StepPhase),
    {
        let mut report = StepReport {
            halted: self.halted,
            ..Default::default()
        };
        if self.halted {
            return report;
        }

        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }

        let dt = world.dt();
        while self.accumulator >= dt && report.steps < self.max_substeps {
            on_step(world, StepPhase::Before);
            world.step();
            on_step(world, StepPhase::After);

            self.accumulator -= dt;
            report.steps += 1;

            if let Some(handle) = world.find_non_finite_body() {
                error!("Body {handle:?} left finite state; halting physics");
                self.halted = true;
                self.accumulator = 0.0;
                report.halted = true;
                return report;
            }
        }

        if self.accumulator >= dt {
            report.dropped = self.accumulator - self.accumulator % dt;
            warn!(
                "Physics fell behind by {:.3}s; dropping {} step(s)",
                report.dropped,
                (report.dropped / dt).round() as u32
            );
            self.accumulator %= dt;
        }

        report
    }

    /// Clears a halt and any carried time.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.halted = false;
    }
}

impl Default for PhysicsStepper {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use rapier3d::prelude::*;

    use super::*;
    use crate::FIXED_DT;

    #[test]
    fn test_whole_steps_only() {
        let mut world = PhysicsWorld::new();
        let mut stepper = PhysicsStepper::new(5);

        let report = stepper.advance(&mut world, FIXED_DT * 2.5, |_, _| {});
        assert_eq!(report.steps, 2);
        assert!((stepper.accumulator() - FIXED_DT * 0.5).abs() < 1e-5);

        let report = stepper.advance(&mut world, FIXED_DT * 0.6, |_, _| {});
        assert_eq!(report.steps, 1);
    }

    #[test]
    fn test_substep_cap_drops_excess() {
        let mut world = PhysicsWorld::new();
        let mut stepper = PhysicsStepper::new(5);

        let report = stepper.advance(&mut world, 1.0, |_, _| {});
        assert_eq!(report.steps, 5);
        assert!(report.dropped > 0.0);
        assert!(stepper.accumulator() < FIXED_DT);
    }

    #[test]
    fn test_callbacks_bracket_each_step() {
        let mut world = PhysicsWorld::new();
        let mut stepper = PhysicsStepper::new(5);
        let mut phases = Vec::new();

        stepper.advance(&mut world, FIXED_DT * 2.0 + 1e-4, |_, phase| phases.push(phase));
        assert_eq!(
            phases,
            vec![StepPhase::Before, StepPhase::After, StepPhase::Before, StepPhase::After]
        );
    }

    #[test]
    fn test_zero_and_negative_frames_ignored() {
        let mut world = PhysicsWorld::new();
        let mut stepper = PhysicsStepper::new(5);
        assert_eq!(stepper.advance(&mut world, 0.0, |_, _| {}).steps, 0);
        assert_eq!(stepper.advance(&mut world, -1.0, |_, _| {}).steps, 0);
        assert_eq!(stepper.advance(&mut world, f32::NAN, |_, _| {}).steps, 0);
        assert_eq!(stepper.accumulator(), 0.0);
    }

    #[test]
    fn test_zero_cap_clamped_to_one() {
        assert_eq!(PhysicsStepper::new(0).max_substeps(), 1);
    }

    #[test]
    fn test_non_finite_body_halts() {
        let mut world = PhysicsWorld::new();
        let (handle, _) = world.insert_body(
            RigidBodyBuilder::dynamic().build(),
            ColliderBuilder::ball(0.5).build(),
        );
        let mut stepper = PhysicsStepper::new(5);

        let report = stepper.advance(&mut world, FIXED_DT * 3.0, |world, phase| {
            if phase == StepPhase::After {
                world.rigid_body_set[handle].set_linvel(Vector::new(f32::INFINITY, 0.0, 0.0), true);
            }
        });
        assert!(report.halted);
        assert_eq!(report.steps, 1);

        let report = stepper.advance(&mut world, FIXED_DT * 3.0, |_, _| {});
        assert_eq!(report.steps, 0);
        assert!(stepper.is_halted());

        stepper.reset();
        assert!(!stepper.is_halted());
    }
}
