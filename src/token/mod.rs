//! Puzzle tokens
//!
//! Two layers: [`DisplayToken`] is what a player sees (and what is persisted),
//! [`ConcreteToken`] is what the solver evaluates. [`DisplayToken::candidates`]
//! is the only bridge between them.

mod counts;
mod kinds;
pub mod notation;

pub use counts::*;
pub use kinds::*;
pub use notation::{format_tokens, parse_concrete_tokens, parse_display_tokens};
