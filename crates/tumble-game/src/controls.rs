//! Key events to player actions, plus a replayable input script.
//!
//! [`Controls`] applies the same edge triggering a keyboard listener would:
//! auto-repeated key-downs do not restart a move or a jump charge, and the
//! two bindings for one direction share a single held flag.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use tumble_physics::PhysicsWorld;
use tumble_player::{Direction, PlayerController};

use crate::error::GameError;

/// Physical keys the game reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Space,
    KeyA,
    ArrowLeft,
    KeyD,
    ArrowRight,
    KeyS,
    ArrowDown,
    Shift,
}

impl Key {
    fn direction(self) -> Option<Direction> {
        match self {
            Key::KeyA | Key::ArrowLeft => Some(Direction::Left),
            Key::KeyD | Key::ArrowRight => Some(Direction::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Down(Key),
    Up(Key),
}

/// Held-key state between events.
#[derive(Debug, Default)]
pub struct Controls {
    left: bool,
    right: bool,
    spin_stop: bool,
    jump_charge: Option<f32>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start time of the jump charge the space bar is holding.
    pub fn jump_charge(&self) -> Option<f32> {
        self.jump_charge
    }

    pub fn is_held(&self, dir: Direction) -> bool {
        match dir {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Applies one key event to the player.
    pub fn handle(&mut self, event: KeyEvent, player: &mut PlayerController, world: &mut PhysicsWorld) {
        trace!("Key {event:?}");
        match event {
            KeyEvent::Down(Key::Space) => {
                if self.jump_charge.is_none() {
                    self.jump_charge = Some(player.begin_jump_charge());
                }
            }
            KeyEvent::Up(Key::Space) => {
                // A release without a press jumps with the shortest charge.
                let start = self.jump_charge.take().unwrap_or(player.now());
                if player.jump(world, start) {
                    debug!("Jump after {:.3}s charge", player.now() - start);
                }
            }
            KeyEvent::Down(Key::KeyS | Key::ArrowDown) => {
                if !self.spin_stop {
                    self.spin_stop = true;
                    player.stop_spin(world);
                }
            }
            KeyEvent::Up(Key::KeyS | Key::ArrowDown) => self.spin_stop = false,
            KeyEvent::Down(Key::Shift) => player.set_brake_modifier(true),
            KeyEvent::Up(Key::Shift) => player.set_brake_modifier(false),
            KeyEvent::Down(key) => {
                if let Some(dir) = key.direction() {
                    let held = self.held_mut(dir);
                    if !*held {
                        *held = true;
                        player.start_move(dir);
                    }
                }
            }
            KeyEvent::Up(key) => {
                if let Some(dir) = key.direction() {
                    *self.held_mut(dir) = false;
                    player.stop_move(dir);
                }
            }
        }
    }

    fn held_mut(&mut self, dir: Direction) -> &mut bool {
        match dir {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }
}

/// A key event at a point in simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedKey {
    /// Seconds since the run started.
    pub at: f32,
    pub event: KeyEvent,
}

/// Key events to replay, stored as RON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputScript {
    pub events: Vec<TimedKey>,
}

impl InputScript {
    /// Walk right, charge a jump onto the ledge, then brake.
    pub fn demo() -> Self {
        use Key::*;
        use KeyEvent::*;
        let events = [
            (0.8, Down(KeyD)),
            (2.0, Down(Space)),
            (2.35, Up(Space)),
            (3.2, Up(KeyD)),
            (3.5, Down(KeyS)),
            (3.6, Up(KeyS)),
            (5.0, Down(ArrowRight)),
            (5.6, Down(Shift)),
            (6.2, Up(Shift)),
            (6.4, Up(ArrowRight)),
        ];
        Self {
            events: events
                .into_iter()
                .map(|(at, event)| TimedKey { at, event })
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, GameError> {
        let contents = std::fs::read_to_string(path).map_err(|source| GameError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ron::from_str(&contents)?)
    }
}

/// Hands out script events as simulated time passes them.
#[derive(Debug)]
pub struct ScriptPlayer {
    events: Vec<TimedKey>,
    cursor: usize,
}

impl ScriptPlayer {
    pub fn new(script: InputScript) -> Self {
        let mut events = script.events;
        events.retain(|e| e.at.is_finite());
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { events, cursor: 0 }
    }

    /// Events with `at <= now` not yet handed out, in time order.
    pub fn due(&mut self, now: f32) -> &[TimedKey] {
        let start = self.cursor;
        while self
            .events
            .get(self.cursor)
            .is_some_and(|event| event.at <= now)
        {
            self.cursor += 1;
        }
        &self.events[start..self.cursor]
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.events.len()
    }
}
