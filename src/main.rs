//! Puzzle demo
//!
//! Walks one simulated student through an assignment: fetch the current
//! puzzle, solve it from the shown tiles, submit, repeat until complete.
//!
//! Environment:
//!   PUZZLE_CONFIG_PATH : assignment catalog JSON (built-in sample if unset)
//!   DEMO_STUDENT       : student id (default "demo-student")
//!   LOG_LEVEL          : tracing filter
//!   LOG_FORMAT         : "pretty" (default) or "json"

use equation_puzzle_core::config::{load_catalog_from_env, load_catalog_from_str};
use equation_puzzle_core::progress::{AnswerSubmission, InMemoryProgressStore, ProgressStatus};
use equation_puzzle_core::token::format_tokens;
use equation_puzzle_core::{
    cached_catalog, init_catalog, telemetry, ProgressTracker, PuzzleError, PuzzleService, Solver,
};
use tracing::{info, warn};

const SAMPLE_CATALOG: &str = r#"{
    "assignments": [{
        "id": "demo",
        "title": "Equation warm up",
        "optionSets": [
            { "label": "short", "numQuestions": 2,
              "constraints": { "total": 7, "operators": 1 } },
            { "label": "mixed", "numQuestions": 2,
              "constraints": { "total": 9, "operatorSymbols": { "+": 1, "×": 1 }, "heavy": 1 } },
            { "label": "locked", "numQuestions": 1,
              "constraints": { "total": 10, "operators": { "min": 2, "max": 3 }, "lockMode": true } }
        ]
    }]
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let catalog = match load_catalog_from_env()? {
        Some(catalog) => catalog,
        None => load_catalog_from_str(SAMPLE_CATALOG)?,
    };
    init_catalog(catalog);
    let catalog = cached_catalog()?;
    let assignment = catalog
        .assignments
        .first()
        .ok_or_else(|| PuzzleError::config("catalog has no assignments"))?
        .clone();
    let student = std::env::var("DEMO_STUDENT").unwrap_or_else(|_| "demo-student".to_string());

    let store = InMemoryProgressStore::with_catalog((*catalog).clone());
    let service = PuzzleService::new(ProgressTracker::new(store));
    service.tracker().assign(&assignment.id, &student)?;
    service.tracker().start(&assignment.id, &student)?;
    info!(assignment = %assignment.id, %student, questions = assignment.total_questions(), "Demo started");

    let solver = Solver::default();
    loop {
        let summary = service.summary(&assignment.id, &student).await?;
        if summary.status != ProgressStatus::InProgress {
            break;
        }

        let saved = service.current_puzzle(&assignment.id, &student).await?;
        if !saved.is_persisted() {
            warn!("Puzzle was handed out without being stored");
        }
        let slot = saved.into_value();
        let puzzle = &slot.puzzle;
        println!(
            "Q{} [{}] tiles: {}",
            slot.question_number,
            summary.current_option_set.as_deref().unwrap_or("-"),
            format_tokens(&puzzle.elements)
        );
        for lock in &puzzle.locked_positions {
            println!("    slot {} locked to {}", lock.index, lock.value);
        }

        let answer = solver
            .find_with_locks(&puzzle.elements, &puzzle.locked_positions)
            .map(|equation| format_tokens(&equation.values()))
            .unwrap_or_default();
        println!("    answer: {}", answer);

        let progress = service
            .submit_answer(
                &assignment.id,
                &student,
                AnswerSubmission {
                    question_number: slot.question_number,
                    question_text: String::new(),
                    answer_text: answer,
                    locked_positions: Vec::new(),
                },
            )
            .await?;
        let correct = progress.answers.last().and_then(|a| a.correct);
        println!("    correct: {:?}", correct);
    }

    let summary = service.summary(&assignment.id, &student).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
