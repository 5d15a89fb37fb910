//! Persistence seam for assignments and progress records

use ahash::AHashMap;
use parking_lot::RwLock;

use super::record::StudentProgress;
use crate::config::{Assignment, Catalog, OptionSet};
use crate::error::{PuzzleError, Result};

/// Storage backend for the progress state machine.
///
/// `save_progress` is a compare-and-set on [`StudentProgress::version`]: the
/// record is written only if the stored version equals the one passed in (an
/// absent record counts as version 0). The stored copy, with its version
/// bumped, is returned.
pub trait ProgressStore: Send + Sync {
    fn load_assignment(&self, assignment_id: &str) -> Result<Assignment>;

    fn load_option_sets(&self, assignment_id: &str) -> Result<Vec<OptionSet>> {
        Ok(self.load_assignment(assignment_id)?.option_sets)
    }

    fn load_progress(&self, assignment_id: &str, student_id: &str)
        -> Result<Option<StudentProgress>>;

    fn save_progress(&self, progress: &StudentProgress) -> Result<StudentProgress>;
}

type ProgressKey = (String, String);

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    assignments: RwLock<AHashMap<String, Assignment>>,
    progress: RwLock<AHashMap<ProgressKey, StudentProgress>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        let store = Self::new();
        for assignment in catalog.assignments {
            store.insert_assignment(assignment);
        }
        store
    }

    pub fn insert_assignment(&self, assignment: Assignment) {
        self.assignments
            .write()
            .insert(assignment.id.clone(), assignment);
    }

    pub fn progress_count(&self) -> usize {
        self.progress.read().len()
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn load_assignment(&self, assignment_id: &str) -> Result<Assignment> {
        self.assignments
            .read()
            .get(assignment_id)
            .cloned()
            .ok_or_else(|| PuzzleError::AssignmentNotFound(assignment_id.to_string()))
    }

    fn load_progress(
        &self,
        assignment_id: &str,
        student_id: &str,
    ) -> Result<Option<StudentProgress>> {
        let key = (assignment_id.to_string(), student_id.to_string());
        Ok(self.progress.read().get(&key).cloned())
    }

    fn save_progress(&self, progress: &StudentProgress) -> Result<StudentProgress> {
        let key = (progress.assignment_id.clone(), progress.student_id.clone());
        let mut records = self.progress.write();
        let found = records.get(&key).map_or(0, |stored| stored.version);
        if found != progress.version {
            return Err(PuzzleError::PersistenceConflict {
                expected: progress.version,
                found,
            });
        }
        let mut stored = progress.clone();
        stored.version += 1;
        records.insert(key, stored.clone());
        Ok(stored)
    }
}
