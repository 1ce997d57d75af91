//! Self-persistence modifiers
//!
//! Each state carries a multiplier on its base self weight. Stimuli push it
//! around (`adjust`), every tick relaxes it back toward 1.0 (`decay`). These are
//! the only values that change while the engine runs.

use crate::catalog::StateCatalog;
use crate::error::{MoodError, Result};

/// Neutral modifier; decay pulls every state back here.
pub const BASELINE_MODIFIER: f64 = 1.0;

/// Effective self weight is kept at or below this so switching stays possible.
pub const MAX_EFFECTIVE_SELF: f64 = 99.0;

/// Fraction of the remaining distance to baseline recovered per decay.
pub const DECAY_FRACTION: f64 = 1.0 / 6.0;

/// Result of an `adjust` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub previous: f64,
    pub current: f64,
    /// True when a clamp rule replaced the raw sum.
    pub clamped: bool,
}

/// Modifiers indexed parallel to the catalog.
#[derive(Debug, Clone)]
pub struct ModifierStore {
    modifiers: Vec<f64>,
}

impl ModifierStore {
    pub fn new(catalog: &StateCatalog) -> Self {
        Self {
            modifiers: vec![BASELINE_MODIFIER; catalog.len()],
        }
    }

    pub fn get(&self, catalog: &StateCatalog, state_id: &str) -> Result<f64> {
        let idx = resolve(catalog, state_id)?;
        self.get_by_index(idx).ok_or_else(|| MoodError::state_not_found(state_id))
    }

    pub fn get_by_index(&self, idx: usize) -> Option<f64> {
        self.modifiers.get(idx).copied()
    }

    /// Add `delta`, then clamp into `[0, 99 / base_self_weight]`. A NaN or
    /// infinite `delta` is refused and leaves the modifier untouched.
    pub fn adjust(
        &mut self,
        catalog: &StateCatalog,
        state_id: &str,
        delta: f64,
    ) -> Result<Adjustment> {
        let idx = resolve(catalog, state_id)?;
        if !delta.is_finite() {
            return Err(MoodError::InvariantViolation(format!(
                "non-finite modifier delta {} for '{}'",
                delta, state_id
            )));
        }
        let base = catalog
            .by_index(idx)
            .map(|s| s.base_self_weight())
            .ok_or_else(|| MoodError::state_not_found(state_id))?;

        let slot = self
            .modifiers
            .get_mut(idx)
            .ok_or_else(|| MoodError::state_not_found(state_id))?;

        let previous = *slot;
        let raw = previous + delta;
        let (current, clamped) = if raw < 0.0 {
            (0.0, true)
        } else if raw * base > MAX_EFFECTIVE_SELF {
            (MAX_EFFECTIVE_SELF / base, true)
        } else {
            (raw, false)
        };
        *slot = current;

        Ok(Adjustment {
            previous,
            current,
            clamped,
        })
    }

    /// Move one state's modifier a sixth of the way back to 1.0, as long as its
    /// effective self weight is still within the 99 ceiling.
    pub fn decay(&mut self, catalog: &StateCatalog, state_id: &str) -> Result<()> {
        let idx = resolve(catalog, state_id)?;
        self.decay_index(catalog, idx);
        Ok(())
    }

    /// Decay every state, active or not.
    pub fn decay_all(&mut self, catalog: &StateCatalog) {
        for idx in 0..self.modifiers.len() {
            self.decay_index(catalog, idx);
        }
    }

    fn decay_index(&mut self, catalog: &StateCatalog, idx: usize) {
        let Some(state) = catalog.by_index(idx) else {
            return;
        };
        let Some(modifier) = self.modifiers.get_mut(idx) else {
            return;
        };
        if *modifier * state.base_self_weight() <= MAX_EFFECTIVE_SELF {
            *modifier += (BASELINE_MODIFIER - *modifier) * DECAY_FRACTION;
        }
    }
}

fn resolve(catalog: &StateCatalog, state_id: &str) -> Result<usize> {
    catalog
        .index_of(state_id)
        .ok_or_else(|| MoodError::state_not_found(state_id))
}
