//! Read-only view of the engine for display collaborators.

use moodring_core::RangeSegment;
use serde::Serialize;

/// What a display needs after every step or stimulus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodSnapshot {
    /// Steps taken so far.
    pub tick: u64,
    pub current_state: String,
    /// Declaration order.
    pub states: Vec<StateView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateView {
    pub id: String,
    pub display_color: Option<String>,
    pub self_modifier: f64,
    /// Non-cumulative widths, switch destinations first and `"self"` last.
    pub segments: Vec<RangeSegment>,
}

impl MoodSnapshot {
    pub fn state(&self, id: &str) -> Option<&StateView> {
        self.states.iter().find(|s| s.id == id)
    }

    pub fn current(&self) -> Option<&StateView> {
        self.state(&self.current_state)
    }
}

impl StateView {
    pub fn segment(&self, key: &str) -> Option<f64> {
        self.segments
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.width_percent)
    }

    /// Percent chance of staying put.
    pub fn self_width(&self) -> f64 {
        self.segment(moodring_core::SELF_KEY).unwrap_or(0.0)
    }
}
