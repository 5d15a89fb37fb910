//! Constructive generation of solvable token sets
//!
//! Each attempt lays out a concrete equation first (term shapes, operators,
//! values) and derives the token set from it, so every emitted set carries a
//! known solution. The solver then confirms the set independently.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use super::puzzle::GeneratedPuzzle;
use super::shape::{has_zero_digit, split_light_tiles, TermShape};
use crate::config::{ConstraintCategory, ConstraintSpec, OperatorMode};
use crate::error::{PuzzleError, Result};
use crate::lock::select_locks;
use crate::solver::evaluator::apply;
use crate::solver::{is_valid_equation, Solver, SolverConfig};
use crate::token::{ConcreteToken, DisplayToken, Operator, PlacedTile, TokenCounts};

/// Configuration for puzzle generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Maximum attempts before giving up
    pub max_attempts: u32,
    /// Attempts honoring every rule; later attempts widen range rules by one
    pub strict_attempts: u32,
    /// Value draws per term layout
    pub inner_samples: u32,
    /// Count solutions up to this cap and report them on the puzzle
    pub report_cap: Option<u64>,
    pub solver: SolverConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 200,
            strict_attempts: 120,
            inner_samples: 48,
            report_cap: None,
            solver: SolverConfig::default(),
        }
    }
}

/// Operator tile: how it is shown and what it computes
type OperatorTile = (DisplayToken, Operator);

type Blame = [u32; ConstraintCategory::ALL.len()];

#[derive(Debug, Clone, Default)]
pub struct PuzzleGenerator {
    config: GeneratorConfig,
    solver: Solver,
}

impl PuzzleGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            solver: Solver::new(config.solver),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Generate a solvable puzzle for `spec`, with locks when lock mode is on
    pub fn generate<R: Rng + ?Sized>(
        &self,
        spec: &ConstraintSpec,
        rng: &mut R,
    ) -> Result<GeneratedPuzzle> {
        let relaxed_spec = spec.relaxed();
        let mut blame: Blame = [0; ConstraintCategory::ALL.len()];

        for attempt in 1..=self.config.max_attempts {
            let strict = attempt <= self.config.strict_attempts;
            let active = if strict { spec } else { &relaxed_spec };

            let mut puzzle = match self.attempt(active, rng) {
                Ok(puzzle) => puzzle,
                Err(category) => {
                    blame[category as usize] += 1;
                    continue;
                }
            };

            puzzle.relaxed = violated_categories(spec, &puzzle.elements);
            if !puzzle.relaxed.is_empty() {
                warn!(
                    target: "generator",
                    attempt,
                    relaxed = ?puzzle.relaxed,
                    "Generated puzzle outside strict constraints"
                );
            }
            if let Some(lock_count) = spec.lock_count().filter(|&n| n > 0) {
                puzzle.locked_positions = select_locks(&puzzle, lock_count, rng, &self.solver);
            }
            if let Some(cap) = self.config.report_cap {
                puzzle.possible_equations =
                    Some(self.solver.count_equations(&puzzle.elements, cap).count);
            }

            info!(
                target: "generator",
                attempt,
                total = puzzle.total(),
                locks = puzzle.locked_positions.len(),
                "Generated puzzle"
            );
            return Ok(puzzle);
        }

        let category = most_blamed(&blame);
        warn!(
            target: "generator",
            attempts = self.config.max_attempts,
            %category,
            ?blame,
            "Puzzle generation exhausted"
        );
        Err(PuzzleError::GenerationExhausted {
            category,
            attempts: self.config.max_attempts,
        })
    }

    /// One constructive attempt; on failure names the category to blame
    fn attempt<R: Rng + ?Sized>(
        &self,
        spec: &ConstraintSpec,
        rng: &mut R,
    ) -> std::result::Result<GeneratedPuzzle, ConstraintCategory> {
        let total = spec.total() as usize;

        // ====================================================================
        // Category counts
        // ====================================================================

        let operators = draw_operators(spec, rng).ok_or(ConstraintCategory::Operators)?;
        let op_count = operators.len();
        let terms = op_count + 2;
        let numbers = total
            .checked_sub(op_count + 1)
            .filter(|&n| n >= terms)
            .ok_or(ConstraintCategory::Operators)?;

        let heavy = spec.heavy().sample(rng) as usize;
        let wildcards = spec.wildcards().sample(rng) as usize;
        if heavy > numbers {
            return Err(ConstraintCategory::Heavy);
        }
        let light = numbers
            .checked_sub(heavy + wildcards)
            .ok_or(ConstraintCategory::Wildcards)?;

        // ====================================================================
        // Term layout
        // ====================================================================

        let (heavy_masks, mut shapes) = layout_terms(rng, terms, numbers, heavy, wildcards)
            .ok_or(if heavy + wildcards > 0 {
                ConstraintCategory::Heavy
            } else {
                ConstraintCategory::Total
            })?;
        shapes.shuffle(rng);
        let left_terms = rng.gen_range(1..terms);
        let light_masks = wildcards - heavy_masks;
        let light_tiles = light + light_masks;

        let zero_target = spec.zeros().sample(rng).min(light as u32) as f64;
        let zero_chance = if light_tiles == 0 {
            0.0
        } else {
            (zero_target / light_tiles as f64).clamp(0.0, 1.0)
        };

        // ====================================================================
        // Values
        // ====================================================================

        let ops: SmallVec<[Operator; 8]> = operators.iter().map(|&(_, op)| op).collect();
        let values = (0..self.config.inner_samples)
            .find_map(|_| sample_values(rng, &shapes, &ops, left_terms, zero_chance))
            .ok_or(ConstraintCategory::Operators)?;

        // ====================================================================
        // Tiles, masks and shuffle
        // ====================================================================

        let mut solution: Vec<PlacedTile> = Vec::with_capacity(total);
        let mut op_tiles = operators.iter();
        for (i, (&shape, &value)) in shapes.iter().zip(values.iter()).enumerate() {
            if i == left_terms {
                solution.push(PlacedTile::plain(ConcreteToken::Equals));
            } else if i > 0 {
                let &(shown, op) = op_tiles.next().ok_or(ConstraintCategory::Operators)?;
                solution.push(PlacedTile {
                    shown,
                    value: ConcreteToken::Op(op),
                });
            }
            solution.extend(shape.tiles(value).into_iter().map(PlacedTile::plain));
        }

        mask_tiles(rng, spec, &mut solution, heavy_masks, light_masks)?;
        if rng.gen_bool(0.5) {
            mirror_sides(&mut solution);
        }

        let mut elements: Vec<DisplayToken> = solution.iter().map(|t| t.shown).collect();
        elements.shuffle(rng);

        // ====================================================================
        // Re-validation
        // ====================================================================

        let concrete: Vec<ConcreteToken> = solution.iter().map(|t| t.value).collect();
        if !is_valid_equation(&concrete) {
            return Err(ConstraintCategory::Operators);
        }
        if let Some(&category) = violated_categories(spec, &elements).first() {
            return Err(category);
        }
        if !self.solver.is_solvable(&elements) {
            debug!(target: "generator", "Solver could not confirm generated set");
            return Err(if wildcards > 0 {
                ConstraintCategory::Wildcards
            } else {
                ConstraintCategory::Total
            });
        }

        Ok(GeneratedPuzzle {
            elements,
            solution,
            locked_positions: Vec::new(),
            possible_equations: None,
            relaxed: Vec::new(),
        })
    }
}

// ============================================================================
// Attempt steps
// ============================================================================

/// Operator tiles for one attempt, in the order they will be placed; `None`
/// when the drawn count cannot fit the total
fn draw_operators<R: Rng + ?Sized>(
    spec: &ConstraintSpec,
    rng: &mut R,
) -> Option<SmallVec<[OperatorTile; 8]>> {
    let tiles = match spec.operator_mode() {
        OperatorMode::Specific(breakdown) => {
            let mut tiles = breakdown.display_tokens();
            tiles.shuffle(rng);
            tiles
                .into_iter()
                .filter_map(|shown| match shown {
                    DisplayToken::Op(op) => Some((shown, op)),
                    DisplayToken::Choice(choice) => {
                        Some((shown, choice.members()[rng.gen_range(0..2)]))
                    }
                    _ => None,
                })
                .collect()
        }
        OperatorMode::Random => {
            let count = spec.operators().sample(rng);
            if count >= spec.total() {
                return None;
            }
            (0..count)
                .map(|_| {
                    let op = Operator::ALL[rng.gen_range(0..Operator::ALL.len())];
                    (DisplayToken::Op(op), op)
                })
                .collect()
        }
    };
    Some(tiles)
}

/// Split wildcards between heavy and light masks and choose term shapes.
///
/// Returns the number of heavy masks and one shape per term.
fn layout_terms<R: Rng + ?Sized>(
    rng: &mut R,
    terms: usize,
    numbers: usize,
    heavy: usize,
    wildcards: usize,
) -> Option<(usize, SmallVec<[TermShape; 12]>)> {
    let feasible: SmallVec<[usize; 8]> = (0..=wildcards)
        .filter(|&masks| {
            let heavy_terms = heavy + masks;
            heavy_terms <= terms && {
                let light_terms = terms - heavy_terms;
                let light_tiles = numbers - heavy_terms;
                light_tiles >= light_terms && light_tiles <= light_terms * 3
            }
        })
        .collect();
    let &heavy_masks = feasible.choose(rng)?;

    let heavy_terms = heavy + heavy_masks;
    let lengths = split_light_tiles(rng, terms - heavy_terms, numbers - heavy_terms)?;
    let mut shapes: SmallVec<[TermShape; 12]> = SmallVec::from_elem(TermShape::Heavy, heavy_terms);
    shapes.extend(lengths.into_iter().map(TermShape::Light));
    Some((heavy_masks, shapes))
}

/// Draw one term value following `op` applied to `acc`
fn sample_term<R: Rng + ?Sized>(
    rng: &mut R,
    shape: TermShape,
    acc: i64,
    op: Option<Operator>,
    zero_chance: f64,
) -> Option<i64> {
    match op {
        Some(Operator::Div) => shape.sample_divisor(rng, acc),
        _ => Some(shape.sample(rng, zero_chance)),
    }
}

/// Fold a run of terms, drawing each value
fn sample_side<R: Rng + ?Sized>(
    rng: &mut R,
    shapes: &[TermShape],
    ops: &[Operator],
    zero_chance: f64,
    values: &mut SmallVec<[i64; 12]>,
) -> Option<i64> {
    let mut acc = 0;
    for (i, &shape) in shapes.iter().enumerate() {
        let op = i.checked_sub(1).map(|j| ops[j]);
        let value = sample_term(rng, shape, acc, op, zero_chance)?;
        acc = match op {
            Some(op) => apply(op, acc, value).ok()?,
            None => value,
        };
        values.push(value);
    }
    Some(acc)
}

/// Value `v` with `acc op v == target`
fn invert(op: Operator, acc: i64, target: i64) -> Option<i64> {
    let value = match op {
        Operator::Add => target.checked_sub(acc)?,
        Operator::Sub => acc.checked_sub(target)?,
        Operator::Mul => {
            if acc == 0 || target % acc != 0 {
                return None;
            }
            target / acc
        }
        Operator::Div => {
            if target == 0 || acc % target != 0 {
                return None;
            }
            acc / target
        }
    };
    (apply(op, acc, value).ok()? == target).then_some(value)
}

/// Term values for the whole equation; the last right-hand term closes it
fn sample_values<R: Rng + ?Sized>(
    rng: &mut R,
    shapes: &[TermShape],
    ops: &[Operator],
    left_terms: usize,
    zero_chance: f64,
) -> Option<SmallVec<[i64; 12]>> {
    let mut values = SmallVec::new();
    let (left_shapes, right_shapes) = shapes.split_at(left_terms);
    let (left_ops, right_ops) = ops.split_at(left_terms - 1);

    let target = sample_side(rng, left_shapes, left_ops, zero_chance, &mut values)?;

    let (&closing_shape, open_shapes) = right_shapes.split_last()?;
    let closing = match right_ops.split_last() {
        None => target,
        Some((&op, inner_ops)) => {
            let acc = sample_side(rng, open_shapes, inner_ops, zero_chance, &mut values)?;
            let value = invert(op, acc, target)?;
            if op == Operator::Div && has_zero_digit(value) {
                return None;
            }
            value
        }
    };
    if !closing_shape.fits(closing) {
        return None;
    }
    values.push(closing);
    Some(values)
}

/// Replace number tiles with wildcards so the visible zero count obeys the rule
fn mask_tiles<R: Rng + ?Sized>(
    rng: &mut R,
    spec: &ConstraintSpec,
    solution: &mut [PlacedTile],
    heavy_masks: usize,
    light_masks: usize,
) -> std::result::Result<(), ConstraintCategory> {
    let mut heavy = SmallVec::<[usize; 8]>::new();
    let mut zeros = SmallVec::<[usize; 8]>::new();
    let mut digits = SmallVec::<[usize; 16]>::new();
    for (i, tile) in solution.iter().enumerate() {
        match tile.value {
            ConcreteToken::Number(0) => zeros.push(i),
            ConcreteToken::Number(_) if tile.value.is_heavy() => heavy.push(i),
            ConcreteToken::Number(_) => digits.push(i),
            _ => {}
        }
    }

    let fewest = light_masks.saturating_sub(digits.len());
    let most = light_masks.min(zeros.len());
    let options: SmallVec<[usize; 8]> = (fewest..=most)
        .filter(|&masked| spec.zeros().contains((zeros.len() - masked) as u32))
        .collect();
    let &masked_zeros = options.choose(rng).ok_or(ConstraintCategory::Zeros)?;

    let picks: [(&[usize], usize); 3] = [
        (&heavy[..], heavy_masks),
        (&zeros[..], masked_zeros),
        (&digits[..], light_masks - masked_zeros),
    ];
    for (positions, amount) in picks {
        if amount > positions.len() {
            return Err(ConstraintCategory::Wildcards);
        }
        for i in index::sample(rng, positions.len(), amount) {
            solution[positions[i]].shown = DisplayToken::Wildcard;
        }
    }
    Ok(())
}

/// `a = b` becomes `b = a`
fn mirror_sides(solution: &mut Vec<PlacedTile>) {
    let Some(split) = solution
        .iter()
        .position(|t| t.value == ConcreteToken::Equals)
    else {
        return;
    };
    let right = solution.split_off(split + 1);
    let equals = solution.pop();
    let left = std::mem::replace(solution, right);
    solution.extend(equals);
    solution.extend(left);
}

/// Categories whose count among `elements` breaks the rule in `spec`
fn violated_categories(spec: &ConstraintSpec, elements: &[DisplayToken]) -> Vec<ConstraintCategory> {
    let counts = TokenCounts::from_tokens(elements);
    ConstraintCategory::ALL
        .into_iter()
        .filter(|&category| {
            let count = match category {
                ConstraintCategory::Total => counts.total(),
                ConstraintCategory::Operators => counts.operators(),
                ConstraintCategory::Equals => counts.equals(),
                ConstraintCategory::Heavy => counts.heavy_numbers(),
                ConstraintCategory::Wildcards => counts.wildcards(),
                ConstraintCategory::Zeros => counts.zeros(),
            };
            !spec.rule(category).contains(count as u32)
        })
        .collect()
}

fn most_blamed(blame: &Blame) -> ConstraintCategory {
    ConstraintCategory::ALL
        .into_iter()
        .rev()
        .max_by_key(|&category| blame[category as usize])
        .unwrap_or(ConstraintCategory::Total)
}
