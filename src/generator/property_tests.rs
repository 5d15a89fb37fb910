//! Property tests for generator module
//!
//! Property 4: Generated puzzles are solvable and their elements are exactly the solution tiles
//! Property 5: Locked positions are taken from the solution and keep the puzzle solvable

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ConstraintSpec, CountRule, LockMode};
use crate::generator::PuzzleGenerator;
use crate::solver::is_valid_equation;
use crate::token::{DisplayToken, TokenCounts};

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

/// Specs whose tiles always fit into terms of at most three digits
fn spec_strategy() -> impl Strategy<Value = ConstraintSpec> {
    (1u32..=3, 0u32..=1, 0u32..=1)
        .prop_flat_map(|(ops, heavy, wildcards)| {
            let min_total = 2 * ops + 3;
            let max_total = (4 * ops + 7 - 2 * heavy).min(14);
            (Just(ops), Just(heavy), Just(wildcards), min_total..=max_total)
        })
        .prop_filter_map("spec must validate", |(ops, heavy, wildcards, total)| {
            ConstraintSpec::builder(total)
                .operators(CountRule::Fixed(ops))
                .heavy(CountRule::Fixed(heavy))
                .wildcards(CountRule::Fixed(wildcards))
                .build()
                .ok()
        })
}

fn lock_spec_strategy() -> impl Strategy<Value = ConstraintSpec> {
    (1u32..=2, 8u32..=11).prop_filter_map("spec must validate", |(ops, total)| {
        ConstraintSpec::builder(total)
            .operators(CountRule::Fixed(ops))
            .lock_mode(LockMode::Enabled)
            .build()
            .ok()
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property 4: every generated puzzle is solvable and consistent with its solution
    #[test]
    fn prop_generated_puzzle_is_consistent(spec in spec_strategy(), seed in any::<u64>()) {
        let generator = PuzzleGenerator::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let puzzle = generator.generate(&spec, &mut rng);
        prop_assert!(puzzle.is_ok(), "generation failed for {:?}: {:?}", spec, puzzle);
        let puzzle = puzzle.unwrap();

        prop_assert_eq!(puzzle.elements.len(), spec.total() as usize);
        let shown: Vec<DisplayToken> = puzzle.solution.iter().map(|t| t.shown).collect();
        prop_assert_eq!(
            TokenCounts::from_tokens(&shown),
            TokenCounts::from_tokens(&puzzle.elements)
        );
        prop_assert!(puzzle.solution.iter().all(|t| t.shown.accepts(t.value)));
        prop_assert!(is_valid_equation(&puzzle.solution_tokens()));
        prop_assert!(generator.solver().is_solvable(&puzzle.elements));
    }

    /// Property 4.1: strict puzzles honor every category rule
    #[test]
    fn prop_strict_puzzle_honors_rules(spec in spec_strategy(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let puzzle = PuzzleGenerator::default().generate(&spec, &mut rng).unwrap();
        prop_assume!(puzzle.relaxed.is_empty());

        let counts = TokenCounts::from_tokens(&puzzle.elements);
        prop_assert!(spec.operators().contains(counts.operators() as u32));
        prop_assert_eq!(counts.equals(), 1);
        prop_assert!(spec.heavy().contains(counts.heavy_numbers() as u32));
        prop_assert!(spec.wildcards().contains(counts.wildcards() as u32));
        prop_assert!(spec.zeros().contains(counts.zeros() as u32));
    }

    /// Property 5: locks point at solution slots and a lock-respecting arrangement exists
    #[test]
    fn prop_locks_come_from_solution(spec in lock_spec_strategy(), seed in any::<u64>()) {
        let generator = PuzzleGenerator::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let puzzle = generator.generate(&spec, &mut rng).unwrap();

        let expected = spec.lock_count().unwrap_or(0);
        prop_assert!(puzzle.locked_positions.len() <= expected);
        for lock in &puzzle.locked_positions {
            prop_assert!(lock.index < puzzle.total());
            prop_assert_eq!(puzzle.solution[lock.index].value, lock.value);
        }
        if !puzzle.locked_positions.is_empty() {
            prop_assert!(generator
                .solver()
                .find_with_locks(&puzzle.elements, &puzzle.locked_positions)
                .is_some());
        }
    }
}
