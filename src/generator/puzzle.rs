//! Generated puzzles and their presentation payload

use serde::{Deserialize, Serialize};

use crate::config::ConstraintCategory;
use crate::token::{ConcreteToken, DisplayToken, LockedPosition, PlacedTile};

/// A token set with the arrangement it was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPuzzle {
    /// Tiles handed to the player, shuffled
    pub elements: Vec<DisplayToken>,
    /// Reference arrangement of exactly the element tiles
    pub solution: Vec<PlacedTile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locked_positions: Vec<LockedPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_equations: Option<u64>,
    /// Categories whose count falls outside the strict rule
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relaxed: Vec<ConstraintCategory>,
}

impl GeneratedPuzzle {
    /// Concrete values of the solution, in order
    pub fn solution_tokens(&self) -> Vec<ConcreteToken> {
        self.solution.iter().map(|t| t.value).collect()
    }

    pub fn total(&self) -> usize {
        self.elements.len()
    }

    pub fn payload(&self, include_solution: bool) -> PuzzlePayload {
        PuzzlePayload {
            elements: self.elements.clone(),
            solution_tokens: include_solution.then(|| self.solution_tokens()),
            locked_positions: (!self.locked_positions.is_empty())
                .then(|| self.locked_positions.clone()),
        }
    }
}

/// JSON shape handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzlePayload {
    pub elements: Vec<DisplayToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_tokens: Option<Vec<ConcreteToken>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_positions: Option<Vec<LockedPosition>>,
}
