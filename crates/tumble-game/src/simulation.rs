//! The per-frame loop tying physics, player, level and camera together.
//!
//! One [`Simulation::frame`] runs, in order:
//!
//! 1. the fixed-step physics advance; around each step the contact tracker
//!    snapshots velocities, the player runs `pre_step`, and new contacts are
//!    classified and fed to `on_contact`;
//! 2. the registry mirror pass, during which the player's hook settles it;
//! 3. the death check and respawn;
//! 4. the camera follow;
//! 5. the HUD snapshot.

use rapier3d::prelude::*;
use tracing::{debug, info, warn};
use tumble_config::Config;
use tumble_level::{CameraRig, DebrisDef, Level, LevelDef, spawn_debris};
use tumble_physics::{
    ContactTracker, MirrorReport, PhysicsStepper, PhysicsWorld, ShapeId, ShapeKind, ShapeRegistry,
    ShapeTick, StepPhase, StepReport, VisualHint, classify_with_threshold, is_body_finite,
};
use tumble_player::{DamageEvent, PlayerController};

use crate::controls::{Controls, KeyEvent};
use crate::error::GameError;
use crate::hud::HudSnapshot;

/// What happened during one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub step: StepReport,
    pub mirror: MirrorReport,
    /// The player was sent back to spawn this frame.
    pub respawned: bool,
    /// Damage the player took this frame.
    pub damage: Vec<DamageEvent>,
    pub hud: HudSnapshot,
}

pub struct Simulation {
    world: PhysicsWorld,
    registry: ShapeRegistry<PlayerController>,
    stepper: PhysicsStepper,
    contacts: ContactTracker,
    level: Level,
    player: PlayerController,
    player_shape: ShapeId,
    controls: Controls,
    camera: CameraRig,
    floor_threshold: f32,
    elapsed: f32,
    deaths: u32,
}

impl Simulation {
    /// Builds the world for `def` and spawns the player at its spawn point.
    pub fn new(config: &Config, def: LevelDef) -> Result<Self, GameError> {
        config.player.validate()?;
        def.validate()?;

        let mut world = PhysicsWorld::with_settings(config.physics.gravity_y, config.physics.timestep);
        let mut registry = ShapeRegistry::new(config.physics.plane_z);
        let level = Level::build(def, &mut world, &mut registry);
        level.spawn_debris(&mut world, &mut registry);

        let spawn = level.spawn_point();
        let player = PlayerController::spawn(&mut world, spawn, config.player.clone());
        let player_shape = registry.register(
            &world,
            player.body(),
            ShapeKind::Dynamic,
            VisualHint::DYNAMIC,
            Some(Box::new(|player: &mut PlayerController, body: &mut RigidBody| {
                player.settle(body);
                ShapeTick::Keep
            })),
        );

        let mut contacts = ContactTracker::new();
        contacts.watch(&world, player.collider());

        info!(
            "Simulation ready: level {:?}, {} shape(s), spawn {spawn}",
            level.def().name,
            registry.len()
        );

        Ok(Self {
            world,
            registry,
            stepper: PhysicsStepper::new(config.physics.max_substeps),
            contacts,
            level,
            player,
            player_shape,
            controls: Controls::new(),
            camera: CameraRig::new(&config.camera, spawn),
            floor_threshold: config.player.floor_normal_threshold,
            elapsed: 0.0,
            deaths: 0,
        })
    }

    /// Builds the level named by `config.level.file`, or the built-in one.
    pub fn from_config(config: &Config) -> Result<Self, GameError> {
        let def = match &config.level.file {
            Some(path) => LevelDef::load(path)?,
            None => LevelDef::builtin(),
        };
        Self::new(config, def)
    }

    /// Applies a reloaded config to the running game.
    ///
    /// Player tuning, gravity, the floor threshold and the camera change at
    /// once; timestep, substep cap, plane depth and level file need a restart.
    pub fn apply_config(&mut self, config: &Config) -> Result<(), GameError> {
        config.player.validate()?;
        self.player.retune(&mut self.world, config.player.clone());
        self.floor_threshold = config.player.floor_normal_threshold;
        self.world.set_gravity(0.0, config.physics.gravity_y, 0.0);
        self.camera = CameraRig::new(&config.camera, self.camera.target);
        info!("Applied reloaded config");
        Ok(())
    }

    /// Feeds one key event to the controls.
    pub fn key(&mut self, event: KeyEvent) {
        self.controls.handle(event, &mut self.player, &mut self.world);
    }

    /// Runs one frame of `frame_dt` seconds.
    ///
    /// Fails once the stepper halts on a non-player body leaving finite
    /// state; the player itself is respawned instead.
    pub fn frame(&mut self, frame_dt: f32) -> Result<FrameReport, GameError> {
        let floor_threshold = self.floor_threshold;
        let mut respawned = false;

        let Self {
            world,
            stepper,
            contacts,
            level,
            player,
            ..
        } = self;

        let step = stepper.advance(world, frame_dt, |world, phase| match phase {
            StepPhase::Before => {
                contacts.before_step(world);
                let dt = world.dt();
                player.pre_step(world, level.ground(), dt);
            }
            StepPhase::After => {
                contacts.after_step(world);
                for event in contacts.drain() {
                    let class =
                        classify_with_threshold(&event, player.collider(), level.ground(), floor_threshold);
                    player.on_contact(world, &event, &class);
                }
                let broken = world
                    .rigid_body_set
                    .get(player.body())
                    .is_some_and(|body| !is_body_finite(body));
                if broken {
                    warn!("Player body left finite state; respawning");
                    level.respawn_player(player, world);
                    contacts.reset(player.collider());
                    respawned = true;
                }
            }
        });
        if step.halted {
            return Err(GameError::SimulationHalted);
        }
        self.elapsed += step.steps as f32 * self.world.dt();

        let mirror = self.registry.mirror(&mut self.world, &mut self.player);

        if self.level.is_player_dead(&self.player, &self.world) {
            info!("Player fell out of the level; respawning");
            self.level.respawn_player(&mut self.player, &mut self.world);
            self.contacts.reset(self.player.collider());
            respawned = true;
        }
        if respawned {
            self.deaths += 1;
            self.camera.snap_to(self.level.spawn_point());
        }

        if let Some(position) = self.player.position(&self.world) {
            self.camera.follow(position);
        }

        let damage = self.player.drain_damage();
        for event in &damage {
            debug!("Player hit: {:?} at {:.1} m/s", event.cause, event.impact_speed);
        }

        Ok(FrameReport {
            step,
            mirror,
            respawned,
            damage,
            hud: HudSnapshot::capture(&self.player, &self.world),
        })
    }

    /// Adds a debris cube that despawns below the kill plane.
    pub fn spawn_debris(&mut self, def: &DebrisDef) -> ShapeId {
        spawn_debris(&mut self.world, &mut self.registry, def, self.level.kill_plane_y())
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerController {
        &mut self.player
    }

    pub fn player_shape(&self) -> ShapeId {
        self.player_shape
    }

    pub fn registry(&self) -> &ShapeRegistry<PlayerController> {
        &self.registry
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn stepper(&self) -> &PhysicsStepper {
        &self.stepper
    }

    /// Simulated seconds stepped so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Times the player has been respawned.
    pub fn deaths(&self) -> u32 {
        self.deaths
    }
}
