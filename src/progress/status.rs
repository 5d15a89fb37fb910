//! Assignment progress status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a student stands on an assignment; only ever moves forward
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    Todo,
    InProgress,
    Complete,
    Done,
}

impl ProgressStatus {
    /// The only status this one may move to
    pub fn next(self) -> Option<ProgressStatus> {
        match self {
            ProgressStatus::Todo => Some(ProgressStatus::InProgress),
            ProgressStatus::InProgress => Some(ProgressStatus::Complete),
            ProgressStatus::Complete => Some(ProgressStatus::Done),
            ProgressStatus::Done => None,
        }
    }

    #[inline]
    pub fn can_advance_to(self, to: ProgressStatus) -> bool {
        self.next() == Some(to)
    }

    #[inline]
    pub fn accepts_answers(self) -> bool {
        self == ProgressStatus::InProgress
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgressStatus::Todo => "todo",
            ProgressStatus::InProgress => "inprogress",
            ProgressStatus::Complete => "complete",
            ProgressStatus::Done => "done",
        };
        f.write_str(name)
    }
}
