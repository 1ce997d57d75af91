//! # Moodring limbic
//!
//! The running half of the mood model. [`MoodEngine`] holds the current mood
//! and advances it one weighted random step per tick; stimuli bias how sticky
//! each mood is, and that bias relaxes back to neutral every tick.
//!
//! ## Driving it
//!
//! The engine is synchronous and never schedules itself. Call
//! [`MoodEngine::step`] from whatever loop owns it, or hand it to
//! [`MoodHeartbeat`], which ticks it on a tokio interval and serializes
//! stimuli onto the same task.
//!
//! Displays read [`MoodSnapshot`]s, either by polling or via `subscribe()`.

mod engine;
mod heartbeat;
mod snapshot;

pub use engine::{MoodEngine, StepOutcome};
pub use heartbeat::{HeartbeatConfig, MoodHeartbeat};
pub use snapshot::{MoodSnapshot, StateView};
