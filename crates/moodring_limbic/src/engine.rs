//! The mood engine
//!
//! Owns the catalogs, the modifier store and the range cache, plus the pointer
//! to the current state. Two entry points mutate it:
//! - `step`: draw a sample, maybe move, then relax every modifier
//! - `apply_stimulus`: push one state's modifier by a configured amount
//!
//! Both run to completion and publish a fresh [`MoodSnapshot`]. The engine has
//! no interior locking; drivers must serialize calls (see `heartbeat`).

use crate::snapshot::{MoodSnapshot, StateView};
use moodring_core::{
    destination_key, AppliedStimulus, Destination, ModifierStore, MoodConfig, MoodError,
    RangeCache, RangeTable, Result, StateCatalog, Stimulus, StimulusCatalog, RANGE_TOTAL,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Tick number after this step.
    pub tick: u64,
    /// The draw, in (0, 100].
    pub sample: f64,
    pub from: String,
    pub to: String,
    /// False when the sample landed on `"self"`.
    pub changed: bool,
}

pub struct MoodEngine<R = StdRng> {
    catalog: StateCatalog,
    stimuli: StimulusCatalog,
    modifiers: ModifierStore,
    ranges: RangeCache,

    /// Catalog index of the active state.
    current: usize,
    tick: u64,
    rng: R,

    snapshot_tx: watch::Sender<MoodSnapshot>,
    snapshot_rx: watch::Receiver<MoodSnapshot>,
}

impl MoodEngine<StdRng> {
    /// Build from config, seeding from `config.seed` or OS entropy.
    pub fn new(config: &MoodConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> MoodEngine<R> {
    /// Build from config with a caller-supplied RNG.
    pub fn with_rng(config: &MoodConfig, rng: R) -> Result<Self> {
        let catalog = StateCatalog::load(&config.states)?;
        let stimuli = StimulusCatalog::load(&config.stimuli, &catalog)?;

        let current = match &config.initial_state {
            Some(id) => catalog.index_of(id).ok_or_else(|| {
                MoodError::Config(format!("initial_state '{}' is not a configured state", id))
            })?,
            None => 0,
        };

        let modifiers = ModifierStore::new(&catalog);
        let ranges = RangeCache::new(&catalog);
        let placeholder = MoodSnapshot {
            tick: 0,
            current_state: String::new(),
            states: Vec::new(),
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(placeholder);

        let mut engine = Self {
            catalog,
            stimuli,
            modifiers,
            ranges,
            current,
            tick: 0,
            rng,
            snapshot_tx,
            snapshot_rx,
        };
        engine.publish();

        tracing::debug!(
            "Mood engine ready: {} states, {} stimuli, starting in '{}'",
            engine.catalog.len(),
            engine.stimuli.len(),
            engine.current_state()
        );
        Ok(engine)
    }

    /// Advance one tick with a fresh random sample.
    pub fn step(&mut self) -> Result<StepOutcome> {
        // gen_range yields [0, 100); flip it so every draw falls in some (lo, hi].
        let sample = RANGE_TOTAL - self.rng.gen_range(0.0..RANGE_TOTAL);
        self.step_with_sample(sample)
    }

    /// Advance one tick using `sample` as the draw.
    pub fn step_with_sample(&mut self, sample: f64) -> Result<StepOutcome> {
        let from = self.current;
        let modifier = self
            .modifiers
            .get_by_index(from)
            .ok_or_else(|| self.dangling_current())?;
        let destination = self
            .ranges
            .get(&self.catalog, from, modifier)
            .map(|table| table.resolve(sample));
        let Some(destination) = destination else {
            return Err(self.dangling_current());
        };

        let to = match destination {
            Destination::Stay => from,
            Destination::State(idx) => idx,
        };
        if self.catalog.by_index(to).is_none() {
            return Err(MoodError::InvariantViolation(format!(
                "range table points at missing state index {}",
                to
            )));
        }

        self.current = to;
        self.modifiers.decay_all(&self.catalog);
        self.tick += 1;

        let outcome = StepOutcome {
            tick: self.tick,
            sample,
            from: destination_key(&self.catalog, Destination::State(from)).to_string(),
            to: self.current_state().to_string(),
            changed: to != from,
        };
        if outcome.changed {
            tracing::debug!(
                "Mood moved {} -> {} (r={:.2}, tick {})",
                outcome.from,
                outcome.to,
                sample,
                self.tick
            );
        } else {
            tracing::trace!("Mood stayed {} (r={:.2}, tick {})", outcome.from, sample, self.tick);
        }

        self.publish();
        Ok(outcome)
    }

    /// Apply a configured stimulus by id. Unknown ids are `NotFound` and leave
    /// the engine untouched.
    pub fn apply_stimulus(&mut self, id: &str) -> Result<AppliedStimulus> {
        let applied = self
            .stimuli
            .apply(id, &self.catalog, &mut self.modifiers)?;
        self.publish();
        Ok(applied)
    }

    fn dangling_current(&self) -> MoodError {
        MoodError::InvariantViolation(format!(
            "current state index {} does not resolve in a catalog of {}",
            self.current,
            self.catalog.len()
        ))
    }
}

impl<R> MoodEngine<R> {
    pub fn current_state(&self) -> &str {
        self.catalog
            .by_index(self.current)
            .map(|s| s.id())
            .unwrap_or_default()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn catalog(&self) -> &StateCatalog {
        &self.catalog
    }

    /// Configured stimuli with their display fields, in declaration order.
    pub fn stimuli(&self) -> impl Iterator<Item = &Stimulus> {
        self.stimuli.iter()
    }

    pub fn self_modifier(&self, state_id: &str) -> Result<f64> {
        self.modifiers.get(&self.catalog, state_id)
    }

    /// Cumulative ranges for `state_id` under its current modifier.
    pub fn ranges(&mut self, state_id: &str) -> Result<RangeTable> {
        let idx = self
            .catalog
            .index_of(state_id)
            .ok_or_else(|| MoodError::state_not_found(state_id))?;
        let modifier = self
            .modifiers
            .get_by_index(idx)
            .ok_or_else(|| MoodError::state_not_found(state_id))?;
        self.ranges
            .get(&self.catalog, idx, modifier)
            .cloned()
            .ok_or_else(|| MoodError::state_not_found(state_id))
    }

    /// How many range tables have been rebuilt so far.
    pub fn range_recomputations(&self) -> u64 {
        self.ranges.recomputations()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> MoodSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receive a new snapshot after every step and stimulus.
    pub fn subscribe(&self) -> watch::Receiver<MoodSnapshot> {
        self.snapshot_rx.clone()
    }

    fn publish(&mut self) {
        let mut states = Vec::with_capacity(self.catalog.len());
        for (idx, state) in self.catalog.iter().enumerate() {
            let modifier = self.modifiers.get_by_index(idx).unwrap_or_default();
            let segments = self
                .ranges
                .get(&self.catalog, idx, modifier)
                .map(|table| table.widths(&self.catalog))
                .unwrap_or_default();
            states.push(StateView {
                id: state.id().to_string(),
                display_color: state.display_color().map(str::to_string),
                self_modifier: modifier,
                segments,
            });
        }

        let snapshot = MoodSnapshot {
            tick: self.tick,
            current_state: self.current_state().to_string(),
            states,
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}
