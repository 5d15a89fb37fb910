//! Random lock selection with solver re-validation

use rand::seq::index;
use rand::Rng;
use tracing::{debug, warn};

use crate::generator::GeneratedPuzzle;
use crate::solver::Solver;
use crate::token::LockedPosition;

/// Draws tried for one lock count before settling for one lock fewer
pub const MAX_RESELECTIONS: usize = 8;

/// Pick `lock_count` solution slots to pre-fill.
///
/// Every returned set is confirmed by [`Solver::find_with_locks`]. When no
/// draw validates, the count drops by one; the result may be empty.
pub fn select_locks<R: Rng + ?Sized>(
    puzzle: &GeneratedPuzzle,
    lock_count: usize,
    rng: &mut R,
    solver: &Solver,
) -> Vec<LockedPosition> {
    let total = puzzle.solution.len();
    let mut count = lock_count.min(total);

    while count > 0 {
        for attempt in 1..=MAX_RESELECTIONS {
            let mut locks: Vec<LockedPosition> = index::sample(rng, total, count)
                .into_iter()
                .map(|index| LockedPosition {
                    index,
                    value: puzzle.solution[index].value,
                })
                .collect();
            locks.sort_unstable();

            if solver.find_with_locks(&puzzle.elements, &locks).is_some() {
                debug!(target: "locks", count, attempt, "Selected locked positions");
                return locks;
            }
        }
        warn!(
            target: "locks",
            count,
            "No lock set validated, trying one lock fewer"
        );
        count -= 1;
    }
    Vec::new()
}
