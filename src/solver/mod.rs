//! Equation solver
//!
//! Arranges a token set into `<left> = <right>` and evaluates each side
//! strictly left to right. Used by the generator to confirm solvability, by
//! the lock selector to re-validate locks and by answer checking.

mod bound;
pub mod evaluator;
mod search;
mod verify;


pub use evaluator::{evaluate_equation, is_valid_equation, Cursor, EvalError};
pub use search::*;
pub use verify::*;
