//! Benchmark for generation and solving
//!
//! Target: a 10-tile puzzle should generate in well under 50ms

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use equation_puzzle_core::config::{ConstraintSpec, CountRule, LockMode, OperatorBreakdown};
use equation_puzzle_core::generator::PuzzleGenerator;
use equation_puzzle_core::solver::Solver;
use equation_puzzle_core::token::parse_display_tokens;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn benchmark_generation(c: &mut Criterion) {
    let generator = PuzzleGenerator::default();
    let small = ConstraintSpec::builder(7).build().unwrap();
    let mixed = ConstraintSpec::builder(10)
        .operator_symbols(OperatorBreakdown {
            add: 1,
            mul: 1,
            ..Default::default()
        })
        .operators(CountRule::Fixed(2))
        .heavy(CountRule::Fixed(1))
        .zeros(CountRule::Fixed(0))
        .build()
        .unwrap();
    let locked = ConstraintSpec::builder(11)
        .operators(CountRule::Range { min: 2, max: 3 })
        .lock_mode(LockMode::Enabled)
        .build()
        .unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    c.bench_function("generate_7_tiles", |b| {
        b.iter(|| black_box(generator.generate(black_box(&small), &mut rng)))
    });
    c.bench_function("generate_10_tiles_mixed", |b| {
        b.iter(|| black_box(generator.generate(black_box(&mixed), &mut rng)))
    });
    c.bench_function("generate_11_tiles_locked", |b| {
        b.iter(|| black_box(generator.generate(black_box(&locked), &mut rng)))
    });
}

fn benchmark_solver(c: &mut Criterion) {
    let solver = Solver::default();
    let sets = [
        "2 3 5 + =",
        "1 2 4 8 × + = 4",
        "3 6 9 1 2 +/- ×/÷ = ?",
        "1 1 2 3 5 8 13 + + - = ",
    ];
    let sets: Vec<_> = sets
        .iter()
        .map(|text| parse_display_tokens(text).unwrap())
        .collect();

    c.bench_function("is_solvable", |b| {
        b.iter(|| {
            for tokens in &sets {
                black_box(solver.is_solvable(black_box(tokens)));
            }
        })
    });

    c.bench_function("count_equations_cap_1000", |b| {
        b.iter(|| {
            for tokens in &sets {
                black_box(solver.count_equations(black_box(tokens), 1000));
            }
        })
    });
}

criterion_group!(benches, benchmark_generation, benchmark_solver);
criterion_main!(benches);
