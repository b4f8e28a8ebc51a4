//! Property-based tests for sequence generation.
//!
//! Small designs only, so every case completes quickly.

use counterbalance::prelude::*;
use proptest::prelude::*;
use std::collections::HashMap;

// Factor levels with at most 6 conditions
fn factor_levels_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop_oneof![
        (2u32..=6).prop_map(|l| vec![l]),
        (2u32..=3).prop_map(|l| vec![2, l]),
    ]
}

fn alternating_strategy() -> impl Strategy<Value = Option<u32>> {
    prop_oneof![Just(None), Just(Some(2)), Just(Some(3))]
}

fn exact_trials(factor_levels: &[u32], alternating: Option<u32>, repeats: usize) -> usize {
    let l: usize = factor_levels.iter().map(|&s| s as usize).product();
    l * l * alternating.map_or(1, |a| a as usize) * repeats
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_length_and_range(
        factor_levels in factor_levels_strategy(),
        alternating in alternating_strategy(),
        repeats in 1usize..=2,
        seed in any::<u64>()
    ) {
        let trials = exact_trials(&factor_levels, alternating, repeats);
        let mut builder = CounterbalanceBuilder::new()
            .trials(trials)
            .factor_levels(factor_levels.clone());
        if let Some(a) = alternating {
            builder = builder.alternating_levels(a);
        }
        let seq = builder.build().unwrap().generate_seeded(seed).unwrap();

        prop_assert_eq!(seq.len(), trials + 1);
        prop_assert_eq!(seq.width(), factor_levels.len() + usize::from(alternating.is_some()));
        prop_assert!(seq.values_in_range());
    }

    #[test]
    fn test_exact_pair_balance(
        factor_levels in factor_levels_strategy(),
        alternating in alternating_strategy(),
        repeats in 1usize..=2,
        seed in any::<u64>()
    ) {
        let trials = exact_trials(&factor_levels, alternating, repeats);
        let mut builder = CounterbalanceBuilder::new()
            .trials(trials)
            .factor_levels(factor_levels);
        if let Some(a) = alternating {
            builder = builder.alternating_levels(a);
        }
        let seq = builder.build().unwrap().generate_seeded(seed).unwrap();

        let report = seq.transition_report(1);
        prop_assert_eq!(report.windows, trials);
        prop_assert_eq!(report.counts.len(), report.cells);
        prop_assert!(report.counts.values().all(|&c| c == repeats));
        prop_assert!(verify_balance(&seq, 1).is_balanced);
    }

    #[test]
    fn test_approximate_within_allowance(
        factor_levels in factor_levels_strategy(),
        trials in 1usize..=60,
        seed in any::<u64>()
    ) {
        let generator = CounterbalanceBuilder::new()
            .trials(trials)
            .factor_levels(factor_levels)
            .allow_approximate_quota(true)
            .build()
            .unwrap();
        let seq = generator.generate_seeded(seed).unwrap();

        prop_assert_eq!(seq.len(), trials + 1);
        let allowance = generator.quotas().allowance() as usize;
        prop_assert!(seq.transition_report(1).max() <= allowance);
    }

    #[test]
    fn test_non_integral_quota_rejected(trials in 1usize..=200) {
        prop_assume!(trials % 4 != 0);
        let err = CounterbalanceBuilder::new()
            .trials(trials)
            .factor_levels(vec![2])
            .build()
            .unwrap_err();
        prop_assert_eq!(err, Error::QuotaNotIntegral { trials, cells: 4 });
    }

    #[test]
    fn test_alternator_cycles(states in 1u32..=10, start in any::<u32>(), steps in 0usize..=40) {
        let a = Alternator::new(states, start).unwrap();
        prop_assert_eq!(a.index(), start % states);

        let mut b = a;
        for _ in 0..steps {
            b = b.advance();
        }
        prop_assert_eq!(b.index() as usize, (a.index() as usize + steps) % states as usize);
        prop_assert_eq!(b.retreat().advance(), b);
        prop_assert_eq!(a.previous_index(), (a.index() + states - 1) % states);
        prop_assert_eq!(a.next_index(), (a.index() + 1) % states);
    }

    #[test]
    fn test_alternation_schedule(start in 0u32..2, seed in any::<u64>()) {
        let seq = CounterbalanceBuilder::new()
            .trials(32)
            .factor_levels(vec![2, 2])
            .alternating_levels(2)
            .alternator_start(AlternatorStart::Fixed(start))
            .build()
            .unwrap()
            .generate_seeded(seed)
            .unwrap();

        let states = seq.alternation_states().unwrap();
        prop_assert_eq!(states[0], (start + 1) % 2);
        for (i, &s) in states[1..].iter().enumerate() {
            prop_assert_eq!(s, (start + i as u32) % 2);
        }
    }

    #[test]
    fn test_same_seed_same_sequence(seed in any::<u64>()) {
        let generator = CounterbalanceBuilder::new()
            .trials(64)
            .factor_levels(vec![2, 2])
            .levels(2)
            .build()
            .unwrap();
        prop_assert_eq!(generator.generate_seeded(seed).unwrap(), generator.generate_seeded(seed).unwrap());
    }

    #[test]
    fn test_budget_bounds_search(attempts in 0usize..=20, seed in any::<u64>()) {
        let err = CounterbalanceBuilder::new()
            .trials(4)
            .factor_levels(vec![2])
            .max_attempts(attempts)
            .constraint(|_: &[Vec<u32>], _: &[u32]| false)
            .build()
            .unwrap()
            .generate_seeded(seed)
            .unwrap_err();

        match err {
            Error::Infeasible { attempts: made, .. } => prop_assert_eq!(made, attempts),
            other => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}

#[test]
fn test_binary_pairs_once_each() {
    for seed in 0..20 {
        let generator = CounterbalanceBuilder::new()
            .trials(4)
            .factor_levels(vec![2])
            .levels(1)
            .build()
            .unwrap();
        let seq = generator.generate_seeded(seed).unwrap();
        let column = seq.factor_column(0);

        let mut pairs: HashMap<(u32, u32), usize> = HashMap::new();
        for w in column.windows(2) {
            *pairs.entry((w[0], w[1])).or_insert(0) += 1;
        }
        assert_eq!(pairs.len(), 4, "seed {}", seed);
        assert!(pairs.values().all(|&c| c == 1));
    }
}

#[test]
fn test_three_way_windows_balanced() {
    // 2 factors, 2 levels each, balanced over triplets
    let seq = counterbalance(128, vec![2, 2], 2).unwrap();
    let report = seq.transition_report(2);
    // The seed's oldest trial is not part of the output
    assert_eq!(report.windows, 127);
    assert!(report.max() <= 2);
    assert!(verify_balance(&seq, 2).is_balanced);
}
