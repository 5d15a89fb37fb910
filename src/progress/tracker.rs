//! Assignment progress state machine
//!
//! `todo → inprogress → complete → done`, one step at a time. Students move
//! the record to `complete` by answering every question in order; only an
//! administrator can mark it `done`.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::record::{AnswerRecord, AnswerSubmission, PuzzleSlot, StudentProgress};
use super::retry::{RetryPolicy, Saved};
use super::status::ProgressStatus;
use super::store::ProgressStore;
use crate::config::Assignment;
use crate::error::{PuzzleError, Result};
use crate::generator::PuzzleGenerator;
use crate::solver::verify_answer;
use crate::token::{format_tokens, parse_concrete_tokens};

/// Compare-and-set rounds before a puzzle write gives up on a busy record
const MAX_CAS_ROUNDS: usize = 8;

// ============================================================================
// Clock and roles
// ============================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock, shared between clones
#[derive(Debug, Clone)]
pub struct FixedClock(Arc<Mutex<DateTime<Utc>>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Administrator,
}

/// Read-only view for dashboards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub status: ProgressStatus,
    pub answered: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub overdue: bool,
    pub current_option_set: Option<String>,
}

// ============================================================================
// Tracker
// ============================================================================

pub struct ProgressTracker<S, C = SystemClock> {
    store: S,
    clock: C,
    generator: PuzzleGenerator,
    retry: RetryPolicy,
}

impl<S: ProgressStore> ProgressTracker<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: ProgressStore, C: Clock> ProgressTracker<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            generator: PuzzleGenerator::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_generator(mut self, generator: PuzzleGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn generator(&self) -> &PuzzleGenerator {
        &self.generator
    }

    /// Create a `todo` record if the student has none yet
    pub fn assign(&self, assignment_id: &str, student_id: &str) -> Result<StudentProgress> {
        self.load_assignment(assignment_id)?;
        if let Some(existing) = self.load_progress(assignment_id, student_id)? {
            return Ok(existing);
        }
        let fresh = StudentProgress::new(assignment_id, student_id);
        match self.save(&fresh) {
            Ok(saved) => {
                info!(target: "progress", assignment_id, student_id, "Assigned");
                Ok(saved)
            }
            // someone else created it first
            Err(PuzzleError::PersistenceConflict { .. }) => self.require_progress(assignment_id, student_id),
            Err(e) => Err(e),
        }
    }

    /// `todo → inprogress`; any other status is returned unchanged
    pub fn start(&self, assignment_id: &str, student_id: &str) -> Result<StudentProgress> {
        let mut progress = self.require_progress(assignment_id, student_id)?;
        if progress.status != ProgressStatus::Todo {
            return Ok(progress);
        }
        progress.advance(ProgressStatus::InProgress, self.clock.now())?;
        let saved = self.save(&progress)?;
        info!(target: "progress", assignment_id, student_id, "Started");
        Ok(saved)
    }

    /// The puzzle for the student's active question, generating and storing
    /// one when none is stored yet
    pub fn get_or_create_current_puzzle<R: Rng + ?Sized>(
        &self,
        assignment_id: &str,
        student_id: &str,
        rng: &mut R,
    ) -> Result<Saved<PuzzleSlot>> {
        let progress = self.require_progress(assignment_id, student_id)?;
        if !progress.status.accepts_answers() {
            return Err(PuzzleError::InactiveAssignment {
                status: progress.status,
            });
        }
        if let Some(slot) = progress.active_puzzle() {
            debug!(target: "progress", assignment_id, student_id, question = slot.question_number, "Resuming stored puzzle");
            return Ok(Saved::Persisted(slot.clone()));
        }

        let assignment = self.load_assignment(assignment_id)?;
        let option_set = assignment
            .option_set(progress.current_option_set_index)
            .ok_or_else(|| {
                PuzzleError::config(format!(
                    "assignment '{}' has no option set {}",
                    assignment_id, progress.current_option_set_index
                ))
            })?;
        let puzzle = self.generator.generate(&option_set.spec, rng)?;
        let slot = PuzzleSlot {
            option_set_index: progress.current_option_set_index,
            question_number: progress.next_question_number(),
            puzzle,
        };
        self.persist_slot(assignment_id, student_id, slot, Some(progress.version))
    }

    /// Store `slot` unless a puzzle already occupies it. The first write wins
    /// and later writers get the retained puzzle back.
    ///
    /// A slot the record has already moved past is a lost race and fails with
    /// `PersistenceConflict`; the caller should fetch the current puzzle again.
    pub fn persist_puzzle(
        &self,
        assignment_id: &str,
        student_id: &str,
        slot: PuzzleSlot,
    ) -> Result<Saved<PuzzleSlot>> {
        self.persist_slot(assignment_id, student_id, slot, None)
    }

    /// `seen` is the record version the slot was derived from, when known
    fn persist_slot(
        &self,
        assignment_id: &str,
        student_id: &str,
        slot: PuzzleSlot,
        seen: Option<u64>,
    ) -> Result<Saved<PuzzleSlot>> {
        match self.retry.run("persist_puzzle", || {
            self.try_persist(assignment_id, student_id, &slot, seen)
        }) {
            Ok(kept) => Ok(Saved::Persisted(kept)),
            Err(reason) if reason.is_transient() => {
                warn!(
                    target: "progress",
                    assignment_id,
                    student_id,
                    error = %reason,
                    "Puzzle not persisted, handing it out unsaved"
                );
                Ok(Saved::Deferred {
                    value: slot,
                    reason,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn try_persist(
        &self,
        assignment_id: &str,
        student_id: &str,
        slot: &PuzzleSlot,
        seen: Option<u64>,
    ) -> Result<PuzzleSlot> {
        let mut base = seen;
        for _ in 0..MAX_CAS_ROUNDS {
            let mut progress = self.require_progress(assignment_id, student_id)?;
            let seen = *base.get_or_insert(progress.version);
            if let Some(existing) = progress.active_puzzle() {
                if existing.is_for(slot.option_set_index, slot.question_number) {
                    return Ok(existing.clone());
                }
            }
            if slot.question_number < progress.next_question_number() {
                debug!(
                    target: "progress",
                    assignment_id,
                    student_id,
                    question = slot.question_number,
                    "Record moved past the slot before its puzzle was stored"
                );
                return Err(PuzzleError::PersistenceConflict {
                    expected: seen,
                    found: progress.version,
                });
            }
            if !slot.is_for(progress.current_option_set_index, progress.next_question_number()) {
                return Err(PuzzleError::OutOfSequenceAnswer {
                    expected: progress.next_question_number(),
                    received: slot.question_number,
                });
            }

            progress.current_puzzle = Some(slot.clone());
            match self.store.save_progress(&progress) {
                Ok(_) => {
                    debug!(target: "progress", assignment_id, student_id, question = slot.question_number, "Stored puzzle");
                    return Ok(slot.clone());
                }
                Err(PuzzleError::PersistenceConflict { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        let found = self.require_progress(assignment_id, student_id)?.version;
        Err(PuzzleError::PersistenceConflict {
            expected: base.unwrap_or(found),
            found,
        })
    }

    /// Record the answer to the next question in sequence
    pub fn submit_answer(
        &self,
        assignment_id: &str,
        student_id: &str,
        submission: &AnswerSubmission,
    ) -> Result<StudentProgress> {
        let assignment = self.load_assignment(assignment_id)?;
        let mut progress = self.require_progress(assignment_id, student_id)?;
        let now = self.clock.now();

        if !progress.status.accepts_answers() {
            return Err(PuzzleError::InactiveAssignment {
                status: progress.status,
            });
        }
        if let Some(due_date) = assignment.due_date.filter(|_| assignment.is_overdue(now)) {
            return Err(PuzzleError::OverdueSubmission { due_date });
        }
        let expected = progress.next_question_number();
        if submission.question_number != expected {
            return Err(PuzzleError::OutOfSequenceAnswer {
                expected,
                received: submission.question_number,
            });
        }

        let (correct, locked_positions, question_text) = match progress.active_puzzle() {
            Some(slot) => {
                let puzzle = &slot.puzzle;
                let correct = parse_concrete_tokens(&submission.answer_text)
                    .ok()
                    .map(|answer| verify_answer(&puzzle.elements, &puzzle.locked_positions, &answer).is_ok())
                    .unwrap_or(false);
                let text = if submission.question_text.is_empty() {
                    format_tokens(&puzzle.elements)
                } else {
                    submission.question_text.clone()
                };
                (Some(correct), puzzle.locked_positions.clone(), text)
            }
            None => (
                None,
                submission.locked_positions.clone(),
                submission.question_text.clone(),
            ),
        };

        progress.answers.push(AnswerRecord {
            question_number: submission.question_number,
            question_text,
            answer_text: submission.answer_text.clone(),
            answered_at: now,
            locked_positions,
            correct,
        });
        progress.current_puzzle = None;
        advance_counters(&mut progress, &assignment);
        if progress.answered() >= assignment.total_questions() {
            progress.advance(ProgressStatus::Complete, now)?;
        }

        let saved = self.save(&progress)?;
        info!(
            target: "progress",
            assignment_id,
            student_id,
            question = submission.question_number,
            ?correct,
            status = %saved.status,
            "Answer recorded"
        );
        Ok(saved)
    }

    /// `complete → done`, administrators only
    pub fn mark_done(&self, assignment_id: &str, student_id: &str, role: Role) -> Result<StudentProgress> {
        if role != Role::Administrator {
            return Err(PuzzleError::Unauthorized(
                "only administrators can mark assignments done".into(),
            ));
        }
        let mut progress = self.require_progress(assignment_id, student_id)?;
        progress.advance(ProgressStatus::Done, self.clock.now())?;
        let saved = self.save(&progress)?;
        info!(target: "progress", assignment_id, student_id, "Marked done");
        Ok(saved)
    }

    pub fn summary(&self, assignment_id: &str, student_id: &str) -> Result<ProgressSummary> {
        let assignment = self.load_assignment(assignment_id)?;
        let progress = self.require_progress(assignment_id, student_id)?;
        let total_questions = assignment.total_questions();
        let current_option_set = match progress.status {
            ProgressStatus::Todo | ProgressStatus::InProgress => assignment
                .option_set(progress.current_option_set_index)
                .map(|set| set.label.clone()),
            ProgressStatus::Complete | ProgressStatus::Done => None,
        };
        Ok(ProgressSummary {
            status: progress.status,
            answered: progress.answered(),
            total_questions,
            percentage: progress.progress_percentage(total_questions),
            overdue: assignment.is_overdue(self.clock.now()),
            current_option_set,
        })
    }

    // ========================================================================
    // Store access
    // ========================================================================

    fn load_assignment(&self, assignment_id: &str) -> Result<Assignment> {
        self.retry
            .run("load_assignment", || self.store.load_assignment(assignment_id))
    }

    fn load_progress(&self, assignment_id: &str, student_id: &str) -> Result<Option<StudentProgress>> {
        self.retry.run("load_progress", || {
            self.store.load_progress(assignment_id, student_id)
        })
    }

    fn require_progress(&self, assignment_id: &str, student_id: &str) -> Result<StudentProgress> {
        self.load_progress(assignment_id, student_id)?
            .ok_or_else(|| PuzzleError::NotAssigned {
                assignment: assignment_id.to_string(),
                student: student_id.to_string(),
            })
    }

    fn save(&self, progress: &StudentProgress) -> Result<StudentProgress> {
        self.retry
            .run("save_progress", || self.store.save_progress(progress))
    }
}

/// Count one more answer in the current option set, moving to the next set
/// once this one is exhausted
fn advance_counters(progress: &mut StudentProgress, assignment: &Assignment) {
    progress.questions_completed_in_current_set += 1;
    let set_size = assignment
        .option_set(progress.current_option_set_index)
        .map_or(0, |set| set.num_questions);
    if progress.questions_completed_in_current_set >= set_size
        && progress.current_option_set_index + 1 < assignment.option_sets.len()
    {
        progress.current_option_set_index += 1;
        progress.questions_completed_in_current_set = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConstraintSpec, CountRule, LockMode, OptionSet};
    use crate::progress::InMemoryProgressStore;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()
    }

    fn assignment() -> Assignment {
        let easy = ConstraintSpec::builder(7).build().unwrap();
        let locked = ConstraintSpec::builder(10)
            .operators(CountRule::Fixed(2))
            .lock_mode(LockMode::Enabled)
            .build()
            .unwrap();
        Assignment::new(
            "week-1",
            vec![
                OptionSet::new("easy", easy, 2).unwrap(),
                OptionSet::new("locked", locked, 2).unwrap(),
            ],
        )
        .unwrap()
        .with_due_date(t0() + Duration::days(7))
    }

    fn tracker() -> (ProgressTracker<InMemoryProgressStore, FixedClock>, FixedClock) {
        let store = InMemoryProgressStore::new();
        store.insert_assignment(assignment());
        let clock = FixedClock::new(t0());
        (ProgressTracker::with_clock(store, clock.clone()), clock)
    }

    fn submission(question_number: u32, answer_text: &str) -> AnswerSubmission {
        AnswerSubmission {
            question_number,
            question_text: String::new(),
            answer_text: answer_text.to_string(),
            locked_positions: Vec::new(),
        }
    }

    fn solve_current(
        tracker: &ProgressTracker<InMemoryProgressStore, FixedClock>,
        rng: &mut StdRng,
    ) -> AnswerSubmission {
        let progress = tracker.store().load_progress("week-1", "ada").unwrap().unwrap();
        let slot = tracker
            .get_or_create_current_puzzle("week-1", "ada", rng)
            .unwrap()
            .into_value();
        assert_eq!(slot.question_number, progress.next_question_number());
        submission(slot.question_number, &format_tokens(&slot.puzzle.solution_tokens()))
    }

    #[test]
    fn test_assign_is_idempotent() {
        let (tracker, _) = tracker();
        let first = tracker.assign("week-1", "ada").unwrap();
        let second = tracker.assign("week-1", "ada").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.status, ProgressStatus::Todo);
        assert_eq!(tracker.store().progress_count(), 1);
        assert!(matches!(
            tracker.assign("missing", "ada"),
            Err(PuzzleError::AssignmentNotFound(_))
        ));
    }

    #[test]
    fn test_start_only_moves_from_todo() {
        let (tracker, _) = tracker();
        assert!(matches!(
            tracker.start("week-1", "ada"),
            Err(PuzzleError::NotAssigned { .. })
        ));
        tracker.assign("week-1", "ada").unwrap();
        let started = tracker.start("week-1", "ada").unwrap();
        assert_eq!(started.status, ProgressStatus::InProgress);
        assert_eq!(started.started_at, Some(t0()));
        let again = tracker.start("week-1", "ada").unwrap();
        assert_eq!(again, started);
    }

    #[test]
    fn test_puzzle_requires_in_progress() {
        let (tracker, _) = tracker();
        tracker.assign("week-1", "ada").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            tracker
                .get_or_create_current_puzzle("week-1", "ada", &mut rng)
                .unwrap_err(),
            PuzzleError::InactiveAssignment {
                status: ProgressStatus::Todo
            }
        );
    }

    #[test]
    fn test_current_puzzle_is_resumed_unchanged() {
        let (tracker, _) = tracker();
        tracker.assign("week-1", "ada").unwrap();
        tracker.start("week-1", "ada").unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let first = tracker
            .get_or_create_current_puzzle("week-1", "ada", &mut rng)
            .unwrap();
        assert!(first.is_persisted());
        let second = tracker
            .get_or_create_current_puzzle("week-1", "ada", &mut rng)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_persist_twice_keeps_first() {
        let (tracker, _) = tracker();
        tracker.assign("week-1", "ada").unwrap();
        tracker.start("week-1", "ada").unwrap();
        let spec = ConstraintSpec::builder(7).build().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let slot = |rng: &mut StdRng| PuzzleSlot {
            option_set_index: 0,
            question_number: 1,
            puzzle: tracker.generator().generate(&spec, rng).unwrap(),
        };
        let a = slot(&mut rng);
        let b = slot(&mut rng);

        let kept_a = tracker.persist_puzzle("week-1", "ada", a.clone()).unwrap();
        let kept_b = tracker.persist_puzzle("week-1", "ada", b).unwrap();
        assert_eq!(kept_a.value(), &a);
        assert_eq!(kept_b.value(), &a);
    }

    #[test]
    fn test_submit_rules() {
        let (tracker, clock) = tracker();
        tracker.assign("week-1", "ada").unwrap();
        assert!(matches!(
            tracker.submit_answer("week-1", "ada", &submission(1, "1 = 1")),
            Err(PuzzleError::InactiveAssignment { .. })
        ));
        tracker.start("week-1", "ada").unwrap();

        assert_eq!(
            tracker
                .submit_answer("week-1", "ada", &submission(2, "1 = 1"))
                .unwrap_err(),
            PuzzleError::OutOfSequenceAnswer {
                expected: 1,
                received: 2
            }
        );

        let saved = tracker
            .submit_answer("week-1", "ada", &submission(1, "1 = 1"))
            .unwrap();
        assert_eq!(saved.answered(), 1);
        // no stored puzzle to check against
        assert_eq!(saved.answers[0].correct, None);

        // duplicate question number is rejected and leaves one answer
        assert!(tracker
            .submit_answer("week-1", "ada", &submission(1, "1 = 1"))
            .is_err());
        let stored = tracker.store().load_progress("week-1", "ada").unwrap().unwrap();
        assert_eq!(stored.answers.len(), 1);

        clock.advance(Duration::days(8));
        assert!(matches!(
            tracker.submit_answer("week-1", "ada", &submission(2, "1 = 1")),
            Err(PuzzleError::OverdueSubmission { .. })
        ));
    }

    #[test]
    fn test_full_run_two_sets_of_two() {
        let (tracker, _) = tracker();
        let mut rng = StdRng::seed_from_u64(4);
        tracker.assign("week-1", "ada").unwrap();
        tracker.start("week-1", "ada").unwrap();

        let expected_sets = [0, 0, 1, 1];
        for (i, &set) in expected_sets.iter().enumerate() {
            let before = tracker.store().load_progress("week-1", "ada").unwrap().unwrap();
            assert_eq!(before.current_option_set_index, set);
            let answer = solve_current(&tracker, &mut rng);
            let after = tracker.submit_answer("week-1", "ada", &answer).unwrap();
            assert_eq!(after.answered(), i as u32 + 1);
            assert_eq!(after.answers[i].correct, Some(true));
            assert!(after.current_puzzle.is_none());
            if set == 1 {
                // second set runs in lock mode: 10 tiles, 2 locked
                assert_eq!(after.answers[i].locked_positions.len(), 2);
            }
        }

        let summary = tracker.summary("week-1", "ada").unwrap();
        assert_eq!(summary.status, ProgressStatus::Complete);
        assert_eq!(summary.percentage, 100);
        assert_eq!(summary.current_option_set, None);

        let done_by_student = tracker.mark_done("week-1", "ada", Role::Student);
        assert!(matches!(done_by_student, Err(PuzzleError::Unauthorized(_))));
        let done = tracker.mark_done("week-1", "ada", Role::Administrator).unwrap();
        assert_eq!(done.status, ProgressStatus::Done);
        assert_eq!(done.marked_done_at, Some(t0()));

        // complete and done reject answers
        assert!(matches!(
            tracker.submit_answer("week-1", "ada", &submission(5, "1 = 1")),
            Err(PuzzleError::InactiveAssignment {
                status: ProgressStatus::Done
            })
        ));
        assert!(tracker.mark_done("week-1", "ada", Role::Administrator).is_err());
    }

    #[test]
    fn test_wrong_answer_is_recorded_as_incorrect() {
        let (tracker, _) = tracker();
        let mut rng = StdRng::seed_from_u64(5);
        tracker.assign("week-1", "ada").unwrap();
        tracker.start("week-1", "ada").unwrap();
        tracker
            .get_or_create_current_puzzle("week-1", "ada", &mut rng)
            .unwrap();
        let saved = tracker
            .submit_answer("week-1", "ada", &submission(1, "not an answer"))
            .unwrap();
        assert_eq!(saved.answers[0].correct, Some(false));
        assert!(!saved.answers[0].question_text.is_empty());
    }

    #[test]
    fn test_mark_done_needs_complete() {
        let (tracker, _) = tracker();
        tracker.assign("week-1", "ada").unwrap();
        tracker.start("week-1", "ada").unwrap();
        assert_eq!(
            tracker
                .mark_done("week-1", "ada", Role::Administrator)
                .unwrap_err(),
            PuzzleError::InvalidTransition {
                from: ProgressStatus::InProgress,
                to: ProgressStatus::Done
            }
        );
    }

    /// Store whose saves fail transiently while `failures` is above zero
    struct FlakyStore {
        inner: InMemoryProgressStore,
        failures: AtomicU32,
    }

    impl ProgressStore for FlakyStore {
        fn load_assignment(&self, assignment_id: &str) -> Result<Assignment> {
            self.inner.load_assignment(assignment_id)
        }

        fn load_progress(&self, a: &str, s: &str) -> Result<Option<StudentProgress>> {
            self.inner.load_progress(a, s)
        }

        fn save_progress(&self, progress: &StudentProgress) -> Result<StudentProgress> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(PuzzleError::Storage {
                    message: "timeout".into(),
                    transient: true,
                });
            }
            self.inner.save_progress(progress)
        }
    }

    fn flaky_tracker() -> ProgressTracker<FlakyStore, FixedClock> {
        let inner = InMemoryProgressStore::new();
        inner.insert_assignment(assignment());
        let store = FlakyStore {
            inner,
            failures: AtomicU32::new(0),
        };
        ProgressTracker::with_clock(store, FixedClock::new(t0())).with_retry(RetryPolicy {
            max_attempts: 3,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(2),
        })
    }

    #[test]
    fn test_transient_save_failures_are_retried() {
        let tracker = flaky_tracker();
        tracker.assign("week-1", "ada").unwrap();
        tracker.store().failures.store(2, Ordering::SeqCst);
        let started = tracker.start("week-1", "ada").unwrap();
        assert_eq!(started.status, ProgressStatus::InProgress);
    }

    #[test]
    fn test_puzzle_is_deferred_when_store_stays_down() {
        let tracker = flaky_tracker();
        tracker.assign("week-1", "ada").unwrap();
        tracker.start("week-1", "ada").unwrap();
        tracker.store().failures.store(100, Ordering::SeqCst);

        let mut rng = StdRng::seed_from_u64(6);
        let saved = tracker
            .get_or_create_current_puzzle("week-1", "ada", &mut rng)
            .unwrap();
        match saved {
            Saved::Deferred { reason, .. } => assert!(reason.is_transient()),
            Saved::Persisted(_) => panic!("store was down, puzzle cannot be persisted"),
        }
        let stored = tracker.store().load_progress("week-1", "ada").unwrap().unwrap();
        assert!(stored.current_puzzle.is_none());
    }

    #[test]
    fn test_racing_submissions_store_one_answer() {
        let (tracker, _) = tracker();
        tracker.assign("week-1", "ada").unwrap();
        tracker.start("week-1", "ada").unwrap();
        let barrier = std::sync::Barrier::new(8);

        let outcomes: Vec<Result<StudentProgress>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        tracker.submit_answer("week-1", "ada", &submission(1, "1 = 1"))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        for outcome in outcomes.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                matches!(
                    outcome,
                    PuzzleError::PersistenceConflict { .. }
                        | PuzzleError::OutOfSequenceAnswer { expected: 2, received: 1 }
                ),
                "unexpected error {outcome:?}"
            );
        }
        let stored = tracker.store().load_progress("week-1", "ada").unwrap().unwrap();
        assert_eq!(stored.answers.len(), 1);
    }

    /// Store that lets another writer slip in right before the next save
    struct RacingStore {
        inner: InMemoryProgressStore,
        race_next_save: AtomicBool,
    }

    impl ProgressStore for RacingStore {
        fn load_assignment(&self, assignment_id: &str) -> Result<Assignment> {
            self.inner.load_assignment(assignment_id)
        }

        fn load_progress(&self, a: &str, s: &str) -> Result<Option<StudentProgress>> {
            self.inner.load_progress(a, s)
        }

        fn save_progress(&self, progress: &StudentProgress) -> Result<StudentProgress> {
            if self.race_next_save.swap(false, Ordering::SeqCst) {
                let current = self
                    .inner
                    .load_progress(&progress.assignment_id, &progress.student_id)?;
                if let Some(current) = current {
                    self.inner.save_progress(&current)?;
                }
            }
            self.inner.save_progress(progress)
        }
    }

    #[test]
    fn test_stale_submission_is_a_conflict() {
        let inner = InMemoryProgressStore::new();
        inner.insert_assignment(assignment());
        let store = RacingStore {
            inner,
            race_next_save: AtomicBool::new(false),
        };
        let tracker = ProgressTracker::with_clock(store, FixedClock::new(t0()));
        tracker.assign("week-1", "ada").unwrap();
        let started = tracker.start("week-1", "ada").unwrap();

        tracker.store().race_next_save.store(true, Ordering::SeqCst);
        assert_eq!(
            tracker
                .submit_answer("week-1", "ada", &submission(1, "1 = 1"))
                .unwrap_err(),
            PuzzleError::PersistenceConflict {
                expected: started.version,
                found: started.version + 1
            }
        );
        let stored = tracker.store().load_progress("week-1", "ada").unwrap().unwrap();
        assert!(stored.answers.is_empty());

        // a fresh read goes through
        let saved = tracker
            .submit_answer("week-1", "ada", &submission(1, "1 = 1"))
            .unwrap();
        assert_eq!(saved.answered(), 1);
    }

    #[test]
    fn test_puzzle_for_answered_slot_is_a_conflict() {
        let (tracker, _) = tracker();
        tracker.assign("week-1", "ada").unwrap();
        tracker.start("week-1", "ada").unwrap();
        let spec = ConstraintSpec::builder(7).build().unwrap();
        let slot = PuzzleSlot {
            option_set_index: 0,
            question_number: 1,
            puzzle: tracker
                .generator()
                .generate(&spec, &mut StdRng::seed_from_u64(7))
                .unwrap(),
        };
        let before = tracker
            .submit_answer("week-1", "ada", &submission(1, "1 = 1"))
            .unwrap();

        let err = tracker.persist_puzzle("week-1", "ada", slot).unwrap_err();
        assert_eq!(
            err,
            PuzzleError::PersistenceConflict {
                expected: before.version,
                found: before.version
            }
        );
        let stored = tracker.store().load_progress("week-1", "ada").unwrap().unwrap();
        assert!(stored.current_puzzle.is_none());

        // a slot ahead of the record is still out of sequence
        let ahead = PuzzleSlot {
            option_set_index: 0,
            question_number: 5,
            puzzle: tracker
                .generator()
                .generate(&spec, &mut StdRng::seed_from_u64(8))
                .unwrap(),
        };
        assert!(matches!(
            tracker.persist_puzzle("week-1", "ada", ahead),
            Err(PuzzleError::OutOfSequenceAnswer { expected: 2, received: 5 })
        ));
    }
}
