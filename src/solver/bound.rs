//! Pruning rules for the arrangement search

use super::evaluator::{Cursor, Term};
use crate::token::{DisplayToken, Operator, TokenCounts, MAX_LIGHT_NUMBER};

/// Whether `remaining` can still complete the equation read so far.
///
/// A `false` answer is exact; `true` only means no cut applies.
pub(super) fn feasible(remaining: &TokenCounts, cursor: &Cursor) -> bool {
    let wildcards = remaining.wildcards();
    let equals = remaining.equals();
    let on_left = cursor.on_left_side();

    // ========================================================================
    // Structural cuts
    // ========================================================================

    let equals_slots = usize::from(on_left);
    if equals > equals_slots {
        return false;
    }
    let equals_from_wildcards = equals_slots - equals;
    if equals_from_wildcards > wildcards {
        return false;
    }

    let terms_needed =
        remaining.operators() + equals_slots + usize::from(cursor.expects_term());
    let number_capable = remaining.numbers() + wildcards - equals_from_wildcards;
    if terms_needed > number_capable {
        return false;
    }

    // ========================================================================
    // Additive cut on the right side
    // ========================================================================

    let Some(left) = cursor.left else {
        return true;
    };
    if remaining.has_multiplicative() {
        return true;
    }
    // an open run with no light digits left is as good as closed
    let settled = match cursor.term {
        Term::Empty => false,
        Term::Open { .. } => remaining.light_numbers() == 0,
        Term::Closed(_) => true,
    };
    let current = if settled {
        match cursor.side_value() {
            Ok(Some(value)) => value,
            _ => return false,
        }
    } else {
        match (cursor.term, cursor.pending) {
            (Term::Empty, None) => 0,
            (Term::Empty, Some((acc, Operator::Add | Operator::Sub))) => acc,
            _ => return true,
        }
    };
    let gap = (left as i128 - current as i128).unsigned_abs();
    gap <= term_sum_bound(remaining) as u128
}

/// Upper bound on the sum of all terms the remaining number tiles can form.
///
/// Light digits are ranked largest first: a third of them can sit in a
/// hundreds place, half of the rest in a tens place, the others count once.
pub(super) fn term_sum_bound(remaining: &TokenCounts) -> u64 {
    let mut digits: Vec<u64> = Vec::with_capacity(remaining.light_numbers());
    for digit in (0..=MAX_LIGHT_NUMBER).rev() {
        let count = remaining.get(DisplayToken::Number(digit));
        digits.extend(std::iter::repeat(digit as u64).take(count as usize));
    }

    let hundreds = digits.len() / 3;
    let tens = (digits.len() - hundreds) / 2;
    let light: u64 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            if i < hundreds {
                d * 100
            } else if i < hundreds + tens {
                d * 10
            } else {
                d
            }
        })
        .sum();

    let heavy: u64 = remaining
        .iter()
        .filter(|(token, _)| token.is_heavy())
        .map(|(token, count)| match token {
            DisplayToken::Number(n) => n as u64 * count as u64,
            _ => 0,
        })
        .sum();

    light + heavy
}
