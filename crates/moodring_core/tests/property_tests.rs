//! Property-based tests for moodring_core.
//!
//! Range tables, modifier clamps and decay must hold their invariants for
//! every valid catalog and every sequence of stimulus deltas, not just the
//! built-in creature.

use moodring_core::{
    compute_ranges, ModifierStore, RangeCache, StateCatalog, StateConfig, MAX_EFFECTIVE_SELF,
    RANGE_TOTAL,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// A valid catalog of 1-6 states with arbitrary weights in [0, 100].
fn arb_state_configs() -> impl Strategy<Value = Vec<StateConfig>> {
    (1usize..=6).prop_flat_map(|n| {
        (
            prop::collection::vec(0.0f64..=100.0, n),
            prop::collection::vec(prop::collection::vec(0.0f64..=100.0, n), n),
        )
            .prop_map(move |(bases, weights)| {
                (0..n)
                    .map(|i| StateConfig {
                        id: format!("s{}", i),
                        base_self_weight: Some(bases[i]),
                        switch_weights: (0..n)
                            .filter(|&j| j != i)
                            .map(|j| (format!("s{}", j), weights[i][j]))
                            .collect(),
                        display_color: None,
                    })
                    .collect()
            })
    })
}

fn arb_deltas() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-5.0f64..=5.0, 1..40)
}

// ============================================================================
// Range table properties
// ============================================================================

proptest! {
    /// **Core invariant**: bounds never decrease and the table closes at exactly 100,
    /// whatever the modifier has been pushed to.
    #[test]
    fn ranges_are_monotone_and_close_at_100(
        configs in arb_state_configs(),
        deltas in arb_deltas(),
    ) {
        let catalog = StateCatalog::load(&configs).unwrap();
        let mut modifiers = ModifierStore::new(&catalog);

        for (i, delta) in deltas.iter().enumerate() {
            let id = format!("s{}", i % catalog.len());
            modifiers.adjust(&catalog, &id, *delta).unwrap();

            for (idx, state) in catalog.iter().enumerate() {
                let modifier = modifiers.get_by_index(idx).unwrap();
                let table = compute_ranges(state, modifier);
                let entries = table.entries();

                prop_assert_eq!(entries.len(), catalog.len());
                let mut previous = 0.0;
                for entry in entries {
                    prop_assert!(entry.bound >= previous,
                        "bounds decreased: {:?}", entries);
                    prop_assert!(entry.bound <= RANGE_TOTAL);
                    previous = entry.bound;
                }
                prop_assert_eq!(entries.last().unwrap().bound, RANGE_TOTAL);
            }
        }
    }

    /// Every sample in (0, 100] lands on some destination listed in the table.
    #[test]
    fn every_sample_resolves(
        configs in arb_state_configs(),
        r in 0.000001f64..=100.0,
    ) {
        let catalog = StateCatalog::load(&configs).unwrap();
        for state in catalog.iter() {
            let table = compute_ranges(state, 1.0);
            let dest = table.resolve(r);
            prop_assert!(table.entries().iter().any(|e| e.destination == dest));
        }
    }

    /// Two lookups with no modifier change in between return the same table
    /// and only the first one computes.
    #[test]
    fn cache_lookups_are_idempotent(configs in arb_state_configs(), modifier in 0.0f64..=1.0) {
        let catalog = StateCatalog::load(&configs).unwrap();
        let mut cache = RangeCache::new(&catalog);

        let first = cache.get(&catalog, 0, modifier).unwrap().clone();
        let misses = cache.recomputations();
        let second = cache.get(&catalog, 0, modifier).unwrap().clone();

        prop_assert_eq!(first, second);
        prop_assert_eq!(cache.recomputations(), misses);
    }
}

// ============================================================================
// Modifier properties
// ============================================================================

proptest! {
    /// **Core invariant**: no sequence of adjustments leaves a modifier
    /// negative or an effective self weight above 99.
    #[test]
    fn adjust_never_escapes_bounds(
        configs in arb_state_configs(),
        deltas in arb_deltas(),
    ) {
        let catalog = StateCatalog::load(&configs).unwrap();
        let mut modifiers = ModifierStore::new(&catalog);

        for (i, delta) in deltas.iter().enumerate() {
            let idx = i % catalog.len();
            let state = catalog.by_index(idx).unwrap();
            let adj = modifiers.adjust(&catalog, state.id(), *delta).unwrap();

            prop_assert!(adj.current >= 0.0, "negative modifier {}", adj.current);
            prop_assert!(adj.current * state.base_self_weight() <= MAX_EFFECTIVE_SELF + 1e-9,
                "effective self {} > 99", adj.current * state.base_self_weight());
            prop_assert!(adj.current.is_finite());
        }
    }

    /// Decay without stimuli moves strictly closer to 1.0 each call while the
    /// effective self weight has headroom.
    #[test]
    fn decay_converges_toward_baseline(
        configs in arb_state_configs(),
        delta in -5.0f64..=5.0,
    ) {
        let catalog = StateCatalog::load(&configs).unwrap();
        let mut modifiers = ModifierStore::new(&catalog);
        let state = catalog.by_index(0).unwrap();
        modifiers.adjust(&catalog, state.id(), delta).unwrap();

        for _ in 0..30 {
            let before = modifiers.get_by_index(0).unwrap();
            let had_headroom = before * state.base_self_weight() <= MAX_EFFECTIVE_SELF;
            modifiers.decay(&catalog, state.id()).unwrap();
            let after = modifiers.get_by_index(0).unwrap();

            if had_headroom && (before - 1.0).abs() > 1e-12 {
                prop_assert!((after - 1.0).abs() < (before - 1.0).abs(),
                    "distance grew: {} -> {}", before, after);
            } else if !had_headroom {
                prop_assert_eq!(after, before);
            }
        }
    }
}
