//! Assignments and their option sets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConstraintSpec;
use crate::error::{PuzzleError, Result};

/// One stage of an assignment: a constraint spec and how many puzzles to draw from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "constraints")]
    pub spec: ConstraintSpec,
    pub num_questions: u32,
}

impl OptionSet {
    pub fn new(label: impl Into<String>, spec: ConstraintSpec, num_questions: u32) -> Result<Self> {
        let set = Self {
            label: label.into(),
            spec,
            num_questions,
        };
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> Result<()> {
        if self.num_questions == 0 {
            return Err(PuzzleError::config(format!(
                "option set '{}' must ask at least one question",
                self.label
            )));
        }
        Ok(())
    }
}

/// Ordered playlist of option sets handed to students
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub option_sets: Vec<OptionSet>,
}

impl Assignment {
    pub fn new(id: impl Into<String>, option_sets: Vec<OptionSet>) -> Result<Self> {
        let assignment = Self {
            id: id.into(),
            title: String::new(),
            due_date: None,
            option_sets,
        };
        assignment.validate()?;
        Ok(assignment)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PuzzleError::config("assignment id must not be empty"));
        }
        if self.option_sets.is_empty() {
            return Err(PuzzleError::config(format!(
                "assignment '{}' has no option sets",
                self.id
            )));
        }
        for set in &self.option_sets {
            set.validate()?;
        }
        Ok(())
    }

    /// Sum of `num_questions` over all option sets
    pub fn total_questions(&self) -> u32 {
        self.option_sets.iter().map(|s| s.num_questions).sum()
    }

    pub fn option_set(&self, index: usize) -> Option<&OptionSet> {
        self.option_sets.get(index)
    }

    #[inline]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date.map_or(false, |due| now > due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn spec() -> ConstraintSpec {
        ConstraintSpec::builder(7).build().unwrap()
    }

    #[test]
    fn test_total_questions() {
        let assignment = Assignment::new(
            "a1",
            vec![
                OptionSet::new("warmup", spec(), 2).unwrap(),
                OptionSet::new("main", spec(), 3).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(assignment.total_questions(), 5);
        assert_eq!(assignment.option_set(1).unwrap().label, "main");
        assert!(assignment.option_set(2).is_none());
    }

    #[test]
    fn test_rejects_empty_and_zero_question_sets() {
        assert!(Assignment::new("a1", vec![]).is_err());
        assert!(OptionSet::new("empty", spec(), 0).is_err());
    }

    #[test]
    fn test_overdue() {
        let now = Utc::now();
        let assignment = Assignment::new("a1", vec![OptionSet::new("s", spec(), 1).unwrap()])
            .unwrap()
            .with_due_date(now);
        assert!(!assignment.is_overdue(now));
        assert!(assignment.is_overdue(now + Duration::seconds(1)));

        let open = Assignment::new("a2", vec![OptionSet::new("s", spec(), 1).unwrap()]).unwrap();
        assert!(!open.is_overdue(now + Duration::days(365)));
    }
}
