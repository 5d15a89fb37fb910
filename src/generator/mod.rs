//! Token-set generation
//!
//! Builds a concrete equation that satisfies a [`ConstraintSpec`](crate::config::ConstraintSpec),
//! then derives the tiles shown to the player from it.

mod builder;
mod puzzle;
mod shape;

#[cfg(test)]
mod property_tests;

pub use builder::*;
pub use puzzle::*;
