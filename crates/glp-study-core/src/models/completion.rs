//! Completion summary models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Data-capture completion of one test for one group on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionStatus {
    Completed,
    Pending,
    #[serde(rename = "Not Assigned")]
    NotAssigned,
}

impl CompletionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionStatus::Completed => "Completed",
            CompletionStatus::Pending => "Pending",
            CompletionStatus::NotAssigned => "Not Assigned",
        }
    }
}

/// Completion counts for a (project, group, test, date).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionSummary {
    pub status: CompletionStatus,
    pub completed_count: u32,
    pub total_count: u32,
    /// Species label of the counted animals (e.g. "Rat")
    pub animal_name: String,
}

impl CompletionSummary {
    /// Sentinel for a missing group/test or an empty roster.
    pub fn not_assigned(animal_name: impl Into<String>) -> Self {
        Self {
            status: CompletionStatus::NotAssigned,
            completed_count: 0,
            total_count: 0,
            animal_name: animal_name.into(),
        }
    }

    /// Derive the status from counts.
    pub fn from_counts(
        completed_count: u32,
        total_count: u32,
        animal_name: impl Into<String>,
    ) -> Self {
        let status = if total_count > 0 && completed_count >= total_count {
            CompletionStatus::Completed
        } else {
            CompletionStatus::Pending
        };

        Self {
            status,
            completed_count,
            total_count,
            animal_name: animal_name.into(),
        }
    }

    pub fn pending_count(&self) -> u32 {
        self.total_count.saturating_sub(self.completed_count)
    }
}

/// Structured cache key for completion summaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionKey {
    pub project_ref: String,
    pub group_id: i64,
    pub test_id: i64,
    pub date: NaiveDate,
}

impl CompletionKey {
    pub fn new(
        project_ref: impl Into<String>,
        group_id: i64,
        test_id: i64,
        date: NaiveDate,
    ) -> Self {
        Self {
            project_ref: project_ref.into(),
            group_id,
            test_id,
            date,
        }
    }
}
