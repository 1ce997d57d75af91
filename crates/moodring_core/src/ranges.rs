//! Cumulative range tables
//!
//! A state's ranges partition (0, 100] into one segment per destination:
//! every other state in declaration order, then the `"self"` segment which
//! always closes at 100. A sample `r` picks the segment whose
//! `(previous_bound, bound]` interval contains it.
//!
//! `compute_ranges` is the pure derivation; `RangeCache` memoizes it per state,
//! keyed by the modifier value that produced each table.

use crate::catalog::{MoodState, StateCatalog};
use serde::Serialize;

/// Display/lookup key of the stay-put segment. Never a valid state id.
pub const SELF_KEY: &str = "self";

/// Upper end of every range table.
pub const RANGE_TOTAL: f64 = 100.0;

/// Where a sample lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Catalog index of another state.
    State(usize),
    /// Remain in the current state.
    Stay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeEntry {
    pub destination: Destination,
    /// Cumulative upper bound in [0, 100].
    pub bound: f64,
}

/// Ordered cumulative distribution for one state.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTable {
    entries: Vec<RangeEntry>,
}

impl RangeTable {
    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    /// Linear scan in declaration order; the first segment with
    /// `previous < r <= bound` wins. Samples outside every segment stay put.
    pub fn resolve(&self, r: f64) -> Destination {
        let mut previous = 0.0;
        for entry in &self.entries {
            if r > previous && r <= entry.bound {
                return entry.destination;
            }
            previous = entry.bound;
        }
        Destination::Stay
    }

    /// Non-cumulative segment widths, floored at zero, keyed by state id or
    /// `"self"`. This is what a bar-chart display draws.
    pub fn widths(&self, catalog: &StateCatalog) -> Vec<RangeSegment> {
        let mut previous = 0.0;
        self.entries
            .iter()
            .map(|entry| {
                let width = (entry.bound - previous).max(0.0);
                previous = entry.bound;
                RangeSegment {
                    key: destination_key(catalog, entry.destination).to_string(),
                    width_percent: width,
                }
            })
            .collect()
    }

    /// Cumulative bound for `key` (a state id or `"self"`), if present.
    pub fn bound_for(&self, catalog: &StateCatalog, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| destination_key(catalog, e.destination) == key)
            .map(|e| e.bound)
    }
}

/// One display segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSegment {
    pub key: String,
    pub width_percent: f64,
}

pub fn destination_key(catalog: &StateCatalog, destination: Destination) -> &str {
    match destination {
        Destination::State(idx) => catalog.by_index(idx).map(|s| s.id()).unwrap_or(SELF_KEY),
        Destination::Stay => SELF_KEY,
    }
}

/// Build the cumulative table for `state` under `modifier`.
///
/// Switch weights are percentages of the space left once the effective self
/// weight is taken out; they are not normalized against each other. Bounds are
/// capped at 100 so over-full weight sets still give a non-decreasing table.
pub fn compute_ranges(state: &MoodState, modifier: f64) -> RangeTable {
    let effective_self = (state.base_self_weight() * modifier).max(0.0);
    let switch_space = (RANGE_TOTAL - effective_self).max(0.0);

    let mut entries = Vec::with_capacity(state.switch_weights().len() + 1);
    let mut running = 0.0;
    for &(idx, weight) in state.switch_weights() {
        running += (weight / RANGE_TOTAL) * switch_space;
        entries.push(RangeEntry {
            destination: Destination::State(idx),
            bound: running.min(RANGE_TOTAL),
        });
    }
    entries.push(RangeEntry {
        destination: Destination::Stay,
        bound: RANGE_TOTAL,
    });

    RangeTable { entries }
}

/// Never equal to a real modifier, so the first lookup always computes.
const UNCACHED: f64 = -1.0;

#[derive(Debug, Clone)]
struct CacheEntry {
    modifier: f64,
    table: RangeTable,
}

/// Per-state memo of `compute_ranges`, invalidated whenever the modifier it
/// was built from no longer matches.
#[derive(Debug, Clone)]
pub struct RangeCache {
    entries: Vec<CacheEntry>,
    recomputations: u64,
}

impl RangeCache {
    pub fn new(catalog: &StateCatalog) -> Self {
        Self {
            entries: vec![
                CacheEntry {
                    modifier: UNCACHED,
                    table: RangeTable { entries: Vec::new() },
                };
                catalog.len()
            ],
            recomputations: 0,
        }
    }

    /// Table for the state at `idx` under `modifier`, recomputed only when the
    /// modifier changed since the cached copy was built.
    pub fn get(
        &mut self,
        catalog: &StateCatalog,
        idx: usize,
        modifier: f64,
    ) -> Option<&RangeTable> {
        let state = catalog.by_index(idx)?;
        let entry = self.entries.get_mut(idx)?;
        if entry.modifier != modifier {
            entry.table = compute_ranges(state, modifier);
            entry.modifier = modifier;
            self.recomputations += 1;
            tracing::trace!(
                "Recomputed ranges for '{}' (modifier={:.4})",
                state.id(),
                modifier
            );
        }
        Some(&entry.table)
    }

    /// How many times a table had to be rebuilt.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
