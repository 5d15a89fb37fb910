//! Position-lock selection
//!
//! Pre-fills some answer slots with their solution values so that larger
//! puzzles leave a fixed number of tiles for the player to place.

mod selector;

pub use selector::*;
