//! Property tests for progress module
//!
//! Property 6: Status never moves backwards, whatever operations are attempted
//! Property 7: Each question number is answered at most once
//! Property 8: Persisting a puzzle for an occupied slot keeps the first one

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{Assignment, ConstraintSpec, OptionSet};
use crate::progress::{
    AnswerSubmission, FixedClock, InMemoryProgressStore, ProgressStatus, ProgressStore,
    ProgressTracker, PuzzleSlot, Role,
};

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Op {
    Start,
    Submit(u32),
    MarkDone(Role),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        (1u32..=5).prop_map(Op::Submit),
        Just(Op::MarkDone(Role::Student)),
        Just(Op::MarkDone(Role::Administrator)),
    ]
}

fn tracker(questions: &[u32]) -> ProgressTracker<InMemoryProgressStore, FixedClock> {
    let now = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
    let sets = questions
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            OptionSet::new(format!("set-{i}"), ConstraintSpec::builder(7).build().unwrap(), n)
                .unwrap()
        })
        .collect();
    let assignment = Assignment::new("a", sets)
        .unwrap()
        .with_due_date(now + Duration::days(1));
    let store = InMemoryProgressStore::new();
    store.insert_assignment(assignment);
    let tracker = ProgressTracker::with_clock(store, FixedClock::new(now));
    tracker.assign("a", "s").unwrap();
    tracker
}

fn questions_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..=2, 1..=2)
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property 6: status is monotonic and only ever takes single steps
    #[test]
    fn prop_status_is_monotonic(
        questions in questions_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..20),
    ) {
        let tracker = tracker(&questions);
        let mut last = ProgressStatus::Todo;
        for op in ops {
            let _ = match op {
                Op::Start => tracker.start("a", "s").map(|_| ()),
                Op::Submit(n) => tracker
                    .submit_answer("a", "s", &AnswerSubmission {
                        question_number: n,
                        question_text: String::new(),
                        answer_text: "1 = 1".into(),
                        locked_positions: Vec::new(),
                    })
                    .map(|_| ()),
                Op::MarkDone(role) => tracker.mark_done("a", "s", role).map(|_| ()),
            };
            let status = tracker.store().load_progress("a", "s").unwrap().unwrap().status;
            prop_assert!(status == last || last.next() == Some(status));
            last = status;
        }
    }

    /// Property 7: answers are numbered 1, 2, 3, ... with no repeats
    #[test]
    fn prop_answers_are_sequential(
        questions in questions_strategy(),
        numbers in prop::collection::vec(1u32..=5, 1..15),
    ) {
        let tracker = tracker(&questions);
        tracker.start("a", "s").unwrap();
        for n in numbers {
            let _ = tracker.submit_answer("a", "s", &AnswerSubmission {
                question_number: n,
                question_text: String::new(),
                answer_text: "1 = 1".into(),
                locked_positions: Vec::new(),
            });
        }
        let progress = tracker.store().load_progress("a", "s").unwrap().unwrap();
        let total: u32 = questions.iter().sum();
        prop_assert!(progress.answered() <= total);
        for (i, answer) in progress.answers.iter().enumerate() {
            prop_assert_eq!(answer.question_number, i as u32 + 1);
        }
        prop_assert_eq!(progress.status == ProgressStatus::Complete, progress.answered() == total);
    }

    /// Property 8: first write wins for a question slot
    #[test]
    fn prop_first_puzzle_write_wins(seed in any::<u64>(), writes in 2usize..5) {
        let tracker = tracker(&[1]);
        tracker.start("a", "s").unwrap();
        let spec = ConstraintSpec::builder(7).build().unwrap();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut first = None;
        for _ in 0..writes {
            let slot = PuzzleSlot {
                option_set_index: 0,
                question_number: 1,
                puzzle: tracker.generator().generate(&spec, &mut rng).unwrap(),
            };
            let kept = tracker.persist_puzzle("a", "s", slot.clone()).unwrap().into_value();
            let first = first.get_or_insert(slot);
            prop_assert_eq!(&kept, &*first);
        }
        let stored = tracker.store().load_progress("a", "s").unwrap().unwrap();
        prop_assert_eq!(stored.current_puzzle.as_ref(), first.as_ref());
    }
}
