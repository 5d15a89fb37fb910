//! Error types for the equation puzzle core engine

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::ConstraintCategory;
use crate::progress::ProgressStatus;

/// Main error type for the equation puzzle core engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generation exhausted after {attempts} attempts (unsatisfiable: {category})")]
    GenerationExhausted {
        category: ConstraintCategory,
        attempts: u32,
    },

    #[error("Out of sequence answer: expected question {expected}, got {received}")]
    OutOfSequenceAnswer { expected: u32, received: u32 },

    #[error("Assignment is not active (status: {status})")]
    InactiveAssignment { status: ProgressStatus },

    #[error("Submission rejected: assignment was due at {due_date}")]
    OverdueSubmission { due_date: DateTime<Utc> },

    #[error("Persistence conflict: expected version {expected}, found {found}")]
    PersistenceConflict { expected: u64, found: u64 },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ProgressStatus,
        to: ProgressStatus,
    },

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Assignment not found: {0}")]
    AssignmentNotFound(String),

    #[error("Student {student} is not assigned to {assignment}")]
    NotAssigned { assignment: String, student: String },

    #[error("Storage error: {message}")]
    Storage { message: String, transient: bool },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl PuzzleError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PuzzleError::Storage { transient: true, .. })
    }

    pub fn config(msg: impl Into<String>) -> Self {
        PuzzleError::Configuration(msg.into())
    }
}

impl From<serde_json::Error> for PuzzleError {
    fn from(err: serde_json::Error) -> Self {
        PuzzleError::Deserialization(err.to_string())
    }
}

impl From<std::io::Error> for PuzzleError {
    fn from(err: std::io::Error) -> Self {
        let transient = matches!(
            err.kind(),
            std::io::ErrorKind::Interrupted
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::WouldBlock
        );
        PuzzleError::Storage {
            message: err.to_string(),
            transient,
        }
    }
}

/// Result type alias for the equation puzzle core engine
pub type Result<T> = std::result::Result<T, PuzzleError>;
