//! Stimuli: named external events that nudge one state's self modifier.

use crate::catalog::StateCatalog;
use crate::config::StimulusConfig;
use crate::error::{MoodError, Result};
use crate::modifier::{Adjustment, ModifierStore};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stimulus {
    pub id: String,
    pub target_state: String,
    pub effect: f64,
    pub display_verb: Option<String>,
    pub display_label: Option<String>,
}

/// Outcome of applying a stimulus.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedStimulus {
    pub stimulus: String,
    pub target: String,
    pub adjustment: Adjustment,
}

#[derive(Debug, Clone, Default)]
pub struct StimulusCatalog {
    stimuli: Vec<Stimulus>,
    by_id: HashMap<String, usize>,
}

impl StimulusCatalog {
    /// Every stimulus must have a unique non-empty id, a finite effect and a
    /// target that exists in `states`. The first bad entry rejects the lot.
    pub fn load(configs: &[StimulusConfig], states: &StateCatalog) -> Result<Self> {
        let mut stimuli = Vec::with_capacity(configs.len());
        let mut by_id = HashMap::with_capacity(configs.len());

        for (idx, cfg) in configs.iter().enumerate() {
            if cfg.id.is_empty() {
                return Err(MoodError::config(format!(
                    "stimulus #{} has an empty id",
                    idx
                )));
            }
            if by_id.insert(cfg.id.clone(), idx).is_some() {
                return Err(MoodError::config(format!(
                    "duplicate stimulus id '{}'",
                    cfg.id
                )));
            }
            if states.index_of(&cfg.target_state).is_none() {
                return Err(MoodError::config(format!(
                    "stimulus '{}' targets unknown state '{}'",
                    cfg.id, cfg.target_state
                )));
            }
            let effect = match cfg.effect {
                Some(effect) if effect.is_finite() => effect,
                Some(_) => {
                    return Err(MoodError::config(format!(
                        "stimulus '{}' has a non-finite effect",
                        cfg.id
                    )))
                }
                None => {
                    return Err(MoodError::config(format!(
                        "stimulus '{}' has no effect",
                        cfg.id
                    )))
                }
            };
            stimuli.push(Stimulus {
                id: cfg.id.clone(),
                target_state: cfg.target_state.clone(),
                effect,
                display_verb: cfg.display_verb.clone(),
                display_label: cfg.display_label.clone(),
            });
        }

        tracing::debug!("Loaded {} stimuli", stimuli.len());
        Ok(Self { stimuli, by_id })
    }

    pub fn get(&self, id: &str) -> Option<&Stimulus> {
        self.by_id.get(id).map(|&idx| &self.stimuli[idx])
    }

    /// Declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Stimulus> {
        self.stimuli.iter()
    }

    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }

    /// Look up `id`, re-resolve its target against `states`, and push the
    /// effect through `modifiers`. The target check repeats the load-time one
    /// because the two catalogs can be built separately.
    pub fn apply(
        &self,
        id: &str,
        states: &StateCatalog,
        modifiers: &mut ModifierStore,
    ) -> Result<AppliedStimulus> {
        let Some(stimulus) = self.get(id) else {
            tracing::warn!("Unknown stimulus '{}'", id);
            return Err(MoodError::stimulus_not_found(id));
        };
        if states.index_of(&stimulus.target_state).is_none() {
            tracing::warn!(
                "Stimulus '{}' targets missing state '{}'",
                id,
                stimulus.target_state
            );
            return Err(MoodError::state_not_found(&stimulus.target_state));
        }

        let adjustment = modifiers.adjust(states, &stimulus.target_state, stimulus.effect)?;
        tracing::debug!(
            "Applied stimulus '{}' to '{}': {:.4} -> {:.4}{}",
            id,
            stimulus.target_state,
            adjustment.previous,
            adjustment.current,
            if adjustment.clamped { " (clamped)" } else { "" }
        );

        Ok(AppliedStimulus {
            stimulus: stimulus.id.clone(),
            target: stimulus.target_state.clone(),
            adjustment,
        })
    }
}
