//! Dashboard-level animal counts for a date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CompletionAggregator;
use crate::models::{CompletionKey, CompletionSummary};
use crate::schedule::ScheduleResolver;

/// Animal totals across every test and group due on a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalCounts {
    pub total_animals: u32,
    pub completed_animals: u32,
    pub pending_animals: u32,
}

impl AnimalCounts {
    fn add(&mut self, summary: &CompletionSummary) {
        self.total_animals += summary.total_count;
        self.completed_animals += summary.completed_count;
        self.pending_animals += summary.pending_count();
    }
}

/// Sum completion over every (test, group) of a project due on `date`.
///
/// Relies on the aggregator's cache; keeps no state of its own.
pub fn animal_counts(
    aggregator: &mut CompletionAggregator<'_>,
    resolver: &ScheduleResolver,
    project_ref: &str,
    date: NaiveDate,
) -> AnimalCounts {
    let snapshot = aggregator.snapshot();
    let range = snapshot.project(project_ref).and_then(|p| p.date_range);
    let mut counts = AnimalCounts::default();

    let due_tests = snapshot
        .tests(project_ref)
        .iter()
        .filter(|test| resolver.resolve(test, range.as_ref(), date).is_scheduled(date));

    for test in due_tests {
        for group in snapshot.groups(project_ref) {
            let key = CompletionKey::new(project_ref, group.id, test.id, date);
            let summary = aggregator.completion_status(&key, false);
            counts.add(&summary);
        }
    }

    counts
}
