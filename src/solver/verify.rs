//! Checking a player's arrangement against the puzzle elements

use thiserror::Error;

use super::evaluator::{evaluate_equation, EvalError};
use super::search::Equation;
use crate::token::{
    ConcreteToken, DisplayToken, LockedPosition, PlacedTile, TokenCounts, MAX_PER_KIND,
};

/// Why an answer was not accepted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerDefect {
    #[error("answer has {actual} tiles, puzzle has {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("more than {limit} copies of {tile}")]
    TooManyCopies { tile: DisplayToken, limit: usize },

    #[error("tile {index} ({value}) is not among the remaining elements")]
    UnavailableTile { index: usize, value: ConcreteToken },

    #[error("slot {index} is locked to {expected}")]
    LockViolated {
        index: usize,
        expected: ConcreteToken,
    },

    #[error("malformed equation: {0}")]
    Malformed(EvalError),

    #[error("sides differ: {left} != {right}")]
    Unbalanced { left: i64, right: i64 },
}

/// Element tile that can stand for `value`, preferring exact tiles, then
/// choice operators, then wildcards
fn claim_tile(available: &mut TokenCounts, value: ConcreteToken) -> Option<DisplayToken> {
    let exact = DisplayToken::from(value);
    let choice = match value {
        ConcreteToken::Op(op) => Some(DisplayToken::Choice(op.choice())),
        _ => None,
    };
    [Some(exact), choice, Some(DisplayToken::Wildcard)]
        .into_iter()
        .flatten()
        .find(|&tile| available.remove(tile))
}

/// Check that `answer` uses exactly the puzzle's elements, honors the locks
/// and balances. Returns the arrangement with each answer tile matched to the
/// element it consumed.
pub fn verify_answer(
    elements: &[DisplayToken],
    locks: &[LockedPosition],
    answer: &[ConcreteToken],
) -> Result<Equation, AnswerDefect> {
    if answer.len() != elements.len() {
        return Err(AnswerDefect::WrongLength {
            expected: elements.len(),
            actual: answer.len(),
        });
    }

    for lock in locks {
        if answer.get(lock.index) != Some(&lock.value) {
            return Err(AnswerDefect::LockViolated {
                index: lock.index,
                expected: lock.value,
            });
        }
    }

    let mut available = TokenCounts::new();
    for &tile in elements {
        if !available.try_add(tile) {
            return Err(AnswerDefect::TooManyCopies {
                tile,
                limit: MAX_PER_KIND,
            });
        }
    }
    let mut tiles = Vec::with_capacity(answer.len());
    for (index, &value) in answer.iter().enumerate() {
        let shown = claim_tile(&mut available, value)
            .ok_or(AnswerDefect::UnavailableTile { index, value })?;
        tiles.push(PlacedTile { shown, value });
    }

    let (left, right) = evaluate_equation(answer).map_err(AnswerDefect::Malformed)?;
    if left != right {
        return Err(AnswerDefect::Unbalanced { left, right });
    }
    Ok(Equation::new(tiles))
}
