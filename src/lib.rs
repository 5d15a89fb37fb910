//! Equation Puzzle Core - tile-based arithmetic puzzle engine
//!
//! This crate generates A-Math style equation puzzles under count
//! constraints, solves and verifies tile arrangements, pre-fills locked
//! answer slots, and tracks student progress through assignments.

pub mod config;
pub mod error;
pub mod generator;
pub mod lock;
pub mod progress;
pub mod service;
pub mod solver;
pub mod telemetry;
pub mod token;

pub use crate::config::{Assignment, Catalog, ConstraintSpec, CountRule, OptionSet};
pub use crate::error::{PuzzleError, Result};
pub use crate::generator::{GeneratedPuzzle, GeneratorConfig, PuzzleGenerator};
pub use crate::progress::{ProgressStatus, ProgressStore, ProgressTracker, StudentProgress};
pub use crate::service::PuzzleService;
pub use crate::solver::{Equation, Solver, SolverConfig};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::sync::Arc;

// ============================================================================
// Cached Catalog
// ============================================================================

/// Process-wide assignment catalog
static CACHED_CATALOG: OnceCell<RwLock<Arc<Catalog>>> = OnceCell::new();

/// Install the catalog; a later call replaces it
pub fn init_catalog(catalog: Catalog) {
    let cell = CACHED_CATALOG.get_or_init(|| RwLock::new(Arc::new(Catalog::default())));
    *cell.write() = Arc::new(catalog);
}

pub fn is_catalog_initialized() -> bool {
    CACHED_CATALOG.get().is_some()
}

/// Snapshot of the installed catalog
pub fn cached_catalog() -> Result<Arc<Catalog>> {
    CACHED_CATALOG
        .get()
        .map(|lock| Arc::clone(&lock.read()))
        .ok_or_else(|| PuzzleError::config("catalog not initialized, call init_catalog first"))
}
