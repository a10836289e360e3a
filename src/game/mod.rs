//! World-state model for the decision loop
//!
//! A [`snapshot::GameSnapshot`] is rebuilt from the sensor battery every
//! cycle; [`state`] carries the persistent pieces (current FSM state,
//! cooldowns, purchase memory, play-mode queue) between cycles.

pub mod snapshot;
pub mod state;

pub use snapshot::GameSnapshot;
pub use state::{BotState, Cooldowns, ModeQueue, OwnedTemplates};
