//! State catalog: the configured moods and their base transition weights.
//!
//! Loaded once from [`StateConfig`]s and immutable afterwards. Declaration order
//! is kept exactly as written because range layout and sampling depend on it.

use crate::config::StateConfig;
use crate::error::{MoodError, Result};
use crate::ranges::SELF_KEY;
use std::collections::HashMap;

/// Weights outside this interval are rejected at load.
pub const MAX_WEIGHT: f64 = 100.0;

/// One configured mood.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodState {
    id: String,
    base_self_weight: f64,
    /// `(catalog index, weight)` for every other state, in declaration order.
    switch_weights: Vec<(usize, f64)>,
    display_color: Option<String>,
}

impl MoodState {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn base_self_weight(&self) -> f64 {
        self.base_self_weight
    }

    pub fn switch_weights(&self) -> &[(usize, f64)] {
        &self.switch_weights
    }

    pub fn display_color(&self) -> Option<&str> {
        self.display_color.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct StateCatalog {
    states: Vec<MoodState>,
    by_id: HashMap<String, usize>,
}

impl StateCatalog {
    /// Two passes: collect and check ids first, then check that every state
    /// carries a weight for each of the others.
    pub fn load(configs: &[StateConfig]) -> Result<Self> {
        if configs.is_empty() {
            return Err(MoodError::config("at least one state is required"));
        }

        let mut by_id = HashMap::with_capacity(configs.len());
        for (idx, cfg) in configs.iter().enumerate() {
            if cfg.id.is_empty() {
                return Err(MoodError::config(format!("state #{} has an empty id", idx)));
            }
            if cfg.id == SELF_KEY {
                return Err(MoodError::config(format!(
                    "state id '{}' is reserved for self-transitions",
                    SELF_KEY
                )));
            }
            if by_id.insert(cfg.id.clone(), idx).is_some() {
                return Err(MoodError::config(format!("duplicate state id '{}'", cfg.id)));
            }
        }

        let mut states = Vec::with_capacity(configs.len());
        for (idx, cfg) in configs.iter().enumerate() {
            let base_self_weight = cfg.base_self_weight.ok_or_else(|| {
                MoodError::config(format!("state '{}' is missing base_self_weight", cfg.id))
            })?;
            check_weight(&cfg.id, "base_self_weight", base_self_weight)?;

            for key in cfg.switch_weights.keys() {
                if key == &cfg.id {
                    return Err(MoodError::config(format!(
                        "state '{}' lists itself in switch_weights",
                        cfg.id
                    )));
                }
                if !by_id.contains_key(key) {
                    return Err(MoodError::config(format!(
                        "state '{}' has a switch weight for unknown state '{}'",
                        cfg.id, key
                    )));
                }
            }

            let mut switch_weights = Vec::with_capacity(configs.len() - 1);
            for (other_idx, other) in configs.iter().enumerate() {
                if other_idx == idx {
                    continue;
                }
                let weight = cfg.switch_weights.get(&other.id).copied().ok_or_else(|| {
                    MoodError::config(format!(
                        "state '{}' is missing a switch weight for '{}'",
                        cfg.id, other.id
                    ))
                })?;
                check_weight(&cfg.id, &other.id, weight)?;
                switch_weights.push((other_idx, weight));
            }

            states.push(MoodState {
                id: cfg.id.clone(),
                base_self_weight,
                switch_weights,
                display_color: cfg.display_color.clone(),
            });
        }

        tracing::debug!("Loaded mood catalog with {} states", states.len());
        Ok(Self { states, by_id })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&MoodState> {
        self.index_of(id).map(|idx| &self.states[idx])
    }

    pub fn by_index(&self, idx: usize) -> Option<&MoodState> {
        self.states.get(idx)
    }

    /// All states in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &MoodState> {
        self.states.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.id.as_str())
    }
}

fn check_weight(state: &str, field: &str, weight: f64) -> Result<()> {
    if !weight.is_finite() || !(0.0..=MAX_WEIGHT).contains(&weight) {
        return Err(MoodError::config(format!(
            "state '{}': weight '{}' = {} is outside [0, {}]",
            state, field, weight, MAX_WEIGHT
        )));
    }
    Ok(())
}
