//! Assignment progress tracking
//!
//! Records which question a student is on, hands out one stored puzzle per
//! question and accepts answers strictly in order.

mod record;
mod retry;
mod status;
mod store;
mod tracker;

#[cfg(test)]
mod property_tests;

pub use record::*;
pub use retry::*;
pub use status::*;
pub use store::*;
pub use tracker::*;
