//! # Moodring core
//!
//! Static data and bookkeeping behind a creature's mood:
//!
//! - [`StateCatalog`]: configured moods and their transition weights
//! - [`ModifierStore`]: per-state self-persistence multipliers (the only runtime-mutable values)
//! - [`RangeCache`]: cumulative distributions derived from weights and modifiers
//! - [`StimulusCatalog`]: named events that perturb one state's modifier
//!
//! Nothing here schedules, draws random numbers, or does I/O beyond reading a
//! config file; the step loop lives in `moodring_limbic`.

pub mod catalog;
pub mod config;
pub mod error;
pub mod modifier;
pub mod ranges;
pub mod stimulus;

pub use catalog::{MoodState, StateCatalog};
pub use config::{HeartbeatSettings, MoodConfig, StateConfig, StimulusConfig};
pub use error::{EntityKind, MoodError, Result};
pub use modifier::{Adjustment, ModifierStore, BASELINE_MODIFIER, MAX_EFFECTIVE_SELF};
pub use ranges::{
    compute_ranges, destination_key, Destination, RangeCache, RangeEntry, RangeTable,
    RangeSegment, RANGE_TOTAL, SELF_KEY,
};
pub use stimulus::{AppliedStimulus, Stimulus, StimulusCatalog};
