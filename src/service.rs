//! Async facade over the generator and progress tracker
//!
//! Generation and solving are CPU-bound, so every call runs on the blocking
//! pool. A semaphore caps how many of them run at once.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::config::ConstraintSpec;
use crate::error::{PuzzleError, Result};
use crate::generator::{GeneratedPuzzle, PuzzleGenerator};
use crate::progress::{
    AnswerSubmission, Clock, ProgressStore, ProgressSummary, ProgressTracker, PuzzleSlot, Saved,
    StudentProgress, SystemClock,
};

pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

pub struct PuzzleService<S, C = SystemClock> {
    tracker: Arc<ProgressTracker<S, C>>,
    permits: Arc<Semaphore>,
}

impl<S, C> Clone for PuzzleService<S, C> {
    fn clone(&self) -> Self {
        Self {
            tracker: Arc::clone(&self.tracker),
            permits: Arc::clone(&self.permits),
        }
    }
}

impl<S, C> PuzzleService<S, C>
where
    S: ProgressStore + 'static,
    C: Clock + 'static,
{
    pub fn new(tracker: ProgressTracker<S, C>) -> Self {
        Self::with_concurrency(tracker, DEFAULT_MAX_CONCURRENT_JOBS)
    }

    pub fn with_concurrency(tracker: ProgressTracker<S, C>, max_jobs: usize) -> Self {
        Self {
            tracker: Arc::new(tracker),
            permits: Arc::new(Semaphore::new(max_jobs.max(1))),
        }
    }

    pub fn tracker(&self) -> &ProgressTracker<S, C> {
        &self.tracker
    }

    /// Generate a standalone puzzle; `seed` makes the draw reproducible
    pub async fn generate(&self, spec: ConstraintSpec, seed: Option<u64>) -> Result<GeneratedPuzzle> {
        let generator: PuzzleGenerator = self.tracker.generator().clone();
        self.run_blocking("generate", move || {
            let mut rng = seeded_rng(seed);
            generator.generate(&spec, &mut rng)
        })
        .await
    }

    pub async fn current_puzzle(&self, assignment_id: &str, student_id: &str) -> Result<Saved<PuzzleSlot>> {
        let tracker = Arc::clone(&self.tracker);
        let (assignment_id, student_id) = (assignment_id.to_string(), student_id.to_string());
        self.run_blocking("current_puzzle", move || {
            let mut rng = seeded_rng(None);
            tracker.get_or_create_current_puzzle(&assignment_id, &student_id, &mut rng)
        })
        .await
    }

    pub async fn submit_answer(
        &self,
        assignment_id: &str,
        student_id: &str,
        submission: AnswerSubmission,
    ) -> Result<StudentProgress> {
        let tracker = Arc::clone(&self.tracker);
        let (assignment_id, student_id) = (assignment_id.to_string(), student_id.to_string());
        self.run_blocking("submit_answer", move || {
            tracker.submit_answer(&assignment_id, &student_id, &submission)
        })
        .await
    }

    pub async fn summary(&self, assignment_id: &str, student_id: &str) -> Result<ProgressSummary> {
        let tracker = Arc::clone(&self.tracker);
        let (assignment_id, student_id) = (assignment_id.to_string(), student_id.to_string());
        self.run_blocking("summary", move || tracker.summary(&assignment_id, &student_id))
            .await
    }

    async fn run_blocking<T, F>(&self, what: &'static str, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| PuzzleError::Storage {
                message: format!("job queue closed: {}", e),
                transient: false,
            })?;
        debug!(target: "service", what, "Running blocking job");

        tokio::task::spawn_blocking(job).await.map_err(|e| {
            error!(target: "service", what, error = %e, "Blocking job panicked");
            PuzzleError::Storage {
                message: format!("{} task failed: {}", what, e),
                transient: false,
            }
        })?
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
