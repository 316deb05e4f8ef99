//! Player kinematics: stances, held intents, charge jumps, grounding and the
//! collision-response state machine.

pub mod controller;
pub mod damage;
pub mod grounded;
pub mod intent;
pub mod jump;
pub mod stance;

pub use controller::{PlayerController, relative_tilt};
pub use damage::{DamageCause, DamageEvent, assess_impact};
pub use grounded::is_grounded;
pub use intent::{AngularIntent, Direction, HorizontalIntent, Pulse};
pub use jump::{ChargeLevel, charge_level, effective_charge, jump_velocity};
pub use stance::{Stance, VolumePreset};
