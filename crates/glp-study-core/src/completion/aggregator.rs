//! Completion aggregator.
//!
//! Counts how many animals of a group have data captured for a test on a
//! date. Sub-typed tests need every sub-type filled per animal.

use chrono::NaiveDate;

use super::CompletionCache;
use crate::models::{
    CapturedRecord, CompletionKey, CompletionSummary, Group, SpeciesType, TestType,
};
use crate::session::{ErrorBag, StudySnapshot};
use crate::source::DataSource;

/// Summarize captured records for one group, test and date.
pub fn summarize(
    group: &Group,
    test: &TestType,
    date: NaiveDate,
    records: &[CapturedRecord],
) -> CompletionSummary {
    let animal_name = group.species().label();
    let roster = group.animal_ids();
    if roster.is_empty() {
        return CompletionSummary::not_assigned(animal_name);
    }

    let relevant: Vec<&CapturedRecord> = records
        .iter()
        .filter(|r| r.group_id == group.id && r.date() == Some(date))
        .collect();

    let completed = roster
        .iter()
        .filter(|animal_id| is_animal_complete(test, animal_id, &relevant))
        .count();

    CompletionSummary::from_counts(completed as u32, roster.len() as u32, animal_name)
}

fn is_animal_complete(test: &TestType, animal_id: &str, records: &[&CapturedRecord]) -> bool {
    let filled: Vec<&CapturedRecord> = records
        .iter()
        .copied()
        .filter(|r| r.animal_id == animal_id && r.has_value())
        .collect();

    if test.requires_sub_types() {
        test.sub_types
            .iter()
            .all(|sub_type| filled.iter().any(|r| r.matches_sub_type(sub_type)))
    } else {
        filled.iter().any(|r| r.test_type_id == test.id)
    }
}

/// Cached completion lookups over a session snapshot.
pub struct CompletionAggregator<'a> {
    source: &'a dyn DataSource,
    snapshot: &'a StudySnapshot,
    cache: &'a mut CompletionCache,
    errors: &'a mut ErrorBag,
}

impl<'a> CompletionAggregator<'a> {
    pub fn new(
        source: &'a dyn DataSource,
        snapshot: &'a StudySnapshot,
        cache: &'a mut CompletionCache,
        errors: &'a mut ErrorBag,
    ) -> Self {
        Self {
            source,
            snapshot,
            cache,
            errors,
        }
    }

    pub fn snapshot(&self) -> &'a StudySnapshot {
        self.snapshot
    }

    /// Completion summary for a key, served from cache unless `force_refresh`.
    pub fn completion_status(
        &mut self,
        key: &CompletionKey,
        force_refresh: bool,
    ) -> CompletionSummary {
        if !force_refresh {
            if let Some(hit) = self.cache.get(key) {
                tracing::debug!(?key, "completion cache hit");
                return hit.clone();
            }
        }

        let summary = self.compute(key);
        tracing::debug!(
            ?key,
            status = summary.status.as_str(),
            completed = summary.completed_count,
            total = summary.total_count,
            "completion computed"
        );
        self.cache.insert(key.clone(), summary.clone());
        summary
    }

    fn compute(&mut self, key: &CompletionKey) -> CompletionSummary {
        let snapshot = self.snapshot;

        let Some(group) = snapshot.group(&key.project_ref, key.group_id) else {
            return CompletionSummary::not_assigned(SpeciesType::Other.label());
        };
        let Some(test) = snapshot.test(&key.project_ref, key.test_id) else {
            return CompletionSummary::not_assigned(group.species().label());
        };
        if group.animal_ids().is_empty() {
            return CompletionSummary::not_assigned(group.species().label());
        }

        let records = match self.source.fetch_captured_records(&key.project_ref) {
            Ok(records) => {
                self.errors.clear_records(&key.project_ref);
                records
            }
            Err(e) => {
                tracing::warn!(project = %key.project_ref, "captured data fetch failed: {e}");
                self.errors.record_records(&key.project_ref, e.to_string());
                Vec::new()
            }
        };

        summarize(group, test, key.date, &records)
    }
}
