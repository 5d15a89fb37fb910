//! Persisted progress records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::ProgressStatus;
use crate::error::{PuzzleError, Result};
use crate::generator::GeneratedPuzzle;
use crate::token::LockedPosition;

/// One submitted answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_number: u32,
    pub question_text: String,
    pub answer_text: String,
    pub answered_at: DateTime<Utc>,
    #[serde(default)]
    pub locked_positions: Vec<LockedPosition>,
    /// `None` when no stored puzzle was available to check against
    #[serde(default)]
    pub correct: Option<bool>,
}

/// Answer as sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_number: u32,
    #[serde(default)]
    pub question_text: String,
    pub answer_text: String,
    #[serde(default)]
    pub locked_positions: Vec<LockedPosition>,
}

/// Puzzle persisted for one question slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleSlot {
    pub option_set_index: usize,
    pub question_number: u32,
    pub puzzle: GeneratedPuzzle,
}

impl PuzzleSlot {
    #[inline]
    pub fn is_for(&self, option_set_index: usize, question_number: u32) -> bool {
        self.option_set_index == option_set_index && self.question_number == question_number
    }
}

/// Progress of one student on one assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub assignment_id: String,
    pub student_id: String,
    pub status: ProgressStatus,
    pub current_option_set_index: usize,
    pub questions_completed_in_current_set: u32,
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_puzzle: Option<PuzzleSlot>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub marked_done_at: Option<DateTime<Utc>>,
    /// Bumped by every successful save
    #[serde(default)]
    pub version: u64,
}

impl StudentProgress {
    pub fn new(assignment_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            assignment_id: assignment_id.into(),
            student_id: student_id.into(),
            status: ProgressStatus::Todo,
            current_option_set_index: 0,
            questions_completed_in_current_set: 0,
            answers: Vec::new(),
            current_puzzle: None,
            started_at: None,
            completed_at: None,
            marked_done_at: None,
            version: 0,
        }
    }

    #[inline]
    pub fn answered(&self) -> u32 {
        self.answers.len() as u32
    }

    /// Question number the next submission must carry
    #[inline]
    pub fn next_question_number(&self) -> u32 {
        self.answered() + 1
    }

    /// Stored puzzle for the slot currently being worked on
    pub fn active_puzzle(&self) -> Option<&PuzzleSlot> {
        self.current_puzzle
            .as_ref()
            .filter(|slot| slot.is_for(self.current_option_set_index, self.next_question_number()))
    }

    /// Whole percent of questions answered, rounded down
    pub fn progress_percentage(&self, total_questions: u32) -> u32 {
        if total_questions == 0 {
            return 0;
        }
        let answered = self.answered().min(total_questions) as u64;
        (answered * 100 / total_questions as u64) as u32
    }

    /// Move one step forward, stamping the matching timestamp
    pub fn advance(&mut self, to: ProgressStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_advance_to(to) {
            return Err(PuzzleError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        match to {
            ProgressStatus::InProgress => self.started_at = Some(now),
            ProgressStatus::Complete => self.completed_at = Some(now),
            ProgressStatus::Done => self.marked_done_at = Some(now),
            ProgressStatus::Todo => {}
        }
        self.status = to;
        Ok(())
    }
}
