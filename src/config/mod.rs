//! Configuration: constraint specs, option sets and the assignment catalog
//!
//! The catalog is a JSON document, usually named by `PUZZLE_CONFIG_PATH`:
//!
//! ```json
//! { "assignments": [ { "id": "week-1", "dueDate": "2026-11-01T00:00:00Z",
//!   "optionSets": [ { "label": "warmup", "numQuestions": 2,
//!     "constraints": { "total": 9, "operators": { "min": 1, "max": 2 } } } ] } ] }
//! ```

mod assignment;
mod constraint;

pub use assignment::*;
pub use constraint::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

use crate::error::Result;

/// Environment variable naming the catalog file
pub const CONFIG_PATH_ENV: &str = "PUZZLE_CONFIG_PATH";

/// All assignments known to a deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Catalog {
    pub fn assignment(&self, id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    fn validate(&self) -> Result<()> {
        for assignment in &self.assignments {
            assignment.validate()?;
        }
        Ok(())
    }
}

/// Parse and validate a catalog from JSON text
pub fn load_catalog_from_str(json: &str) -> Result<Catalog> {
    let catalog: Catalog = serde_json::from_str(json)?;
    catalog.validate()?;
    Ok(catalog)
}

/// Read a catalog file
pub fn load_catalog_from_path(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let catalog = load_catalog_from_str(&text)?;
    info!(
        target: "config",
        path = %path.display(),
        assignments = catalog.assignments.len(),
        "Loaded assignment catalog"
    );
    Ok(catalog)
}

/// Load the catalog named by `PUZZLE_CONFIG_PATH`; `Ok(None)` when unset
pub fn load_catalog_from_env() -> Result<Option<Catalog>> {
    let Ok(path) = std::env::var(CONFIG_PATH_ENV) else {
        return Ok(None);
    };
    match load_catalog_from_path(&path) {
        Ok(catalog) => Ok(Some(catalog)),
        Err(e) => {
            error!(target: "config", %path, error = %e, "Failed to load assignment catalog");
            Err(e)
        }
    }
}
