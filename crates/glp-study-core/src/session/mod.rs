//! Study session: one load of study data plus the completion cache.
//!
//! ```text
//! ┌────────────┐   ┌───────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Activities │──▶│ Canonical │──▶│ Groups/Tests │──▶│ StudySnapshot│
//! └────────────┘   │  dedupe   │   │ per project  │   └──────┬───────┘
//!                  └───────────┘   └──────────────┘          │
//!                                        schedule / completion / board
//! ```
//!
//! Fetch failures for one project land in the [`ErrorBag`] and never abort
//! the rest of the load.

mod board;
mod errors;
mod snapshot;

pub use board::*;
pub use errors::*;
pub use snapshot::*;

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::capture::{CaptureError, CaptureResult, CaptureSheet};
use crate::completion::{animal_counts, AnimalCounts, CompletionAggregator, CompletionCache};
use crate::config::EngineConfig;
use crate::models::{
    canonical_activities, CompletionKey, CompletionSummary, MeasurementSubmission, Project,
    ProjectDates, SubmissionAck,
};
use crate::schedule::{ScheduleResolver, ScheduleStatus, TestSchedule};
use crate::source::{DataSource, SourceResult};

/// Message shown when the activity list itself cannot be fetched.
pub const LOAD_ERROR_MESSAGE: &str = "Error fetching data";

/// A test due today for one group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodayTask {
    pub project_ref: String,
    pub group_id: i64,
    pub group_name: String,
    pub test_id: i64,
    pub test_name: String,
}

/// Loaded study state shared by every screen.
#[derive(Debug, Clone)]
pub struct StudySession {
    config: EngineConfig,
    snapshot: StudySnapshot,
    cache: CompletionCache,
    errors: ErrorBag,
    load_error: Option<String>,
}

impl StudySession {
    /// An empty session, used before the first load.
    pub fn empty(config: EngineConfig) -> Self {
        Self {
            config,
            snapshot: StudySnapshot::new(),
            cache: CompletionCache::new(),
            errors: ErrorBag::new(),
            load_error: None,
        }
    }

    /// Fetch activities, dates, groups and tests.
    pub fn load(source: &dyn DataSource, config: EngineConfig) -> Self {
        let mut session = Self::empty(config);

        let activities = match source.fetch_activities() {
            Ok(activities) => canonical_activities(activities),
            Err(e) => {
                tracing::error!("activity fetch failed: {e}");
                session.load_error = Some(LOAD_ERROR_MESSAGE.to_string());
                return session;
            }
        };

        let dates: HashMap<String, ProjectDates> = match source.fetch_project_date_ranges() {
            Ok(dates) => dates
                .into_iter()
                .map(|d| (d.project_code.clone(), d))
                .collect(),
            Err(e) => {
                tracing::warn!("project date fetch failed, using synthetic ranges: {e}");
                HashMap::new()
            }
        };

        let default_days = session.config.default_project_days;
        for activity in &activities {
            let project_ref = activity.ref_num.as_str();

            let groups = source.fetch_groups(project_ref).unwrap_or_else(|e| {
                tracing::warn!(project = project_ref, "group fetch failed: {e}");
                session.errors.record_groups(project_ref, e.to_string());
                Vec::new()
            });
            let tests = source.fetch_tests(project_ref).unwrap_or_else(|e| {
                tracing::warn!(project = project_ref, "test fetch failed: {e}");
                session.errors.record_tests(project_ref, e.to_string());
                Vec::new()
            });

            let project =
                Project::assemble(activity, dates.get(project_ref), &groups, default_days);
            session.snapshot.insert_project(project, groups, tests);
        }

        tracing::info!(
            projects = session.snapshot.projects().len(),
            failed = session.errors.len(),
            "study session loaded"
        );
        session
    }

    /// Load again, dropping cached completion results.
    pub fn reload(&mut self, source: &dyn DataSource) {
        *self = Self::load(source, self.config.clone());
    }

    /// Replace the configuration. Cached results are kept.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &StudySnapshot {
        &self.snapshot
    }

    pub fn projects(&self) -> &[Project] {
        self.snapshot.projects()
    }

    pub fn errors(&self) -> &ErrorBag {
        &self.errors
    }

    /// Set when the activity list could not be fetched.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.config.reference_date()
    }

    pub fn project_title(&self, project_ref: &str) -> Option<&str> {
        self.snapshot.project(project_ref).map(|p| p.title.as_str())
    }

    pub fn cache(&self) -> &CompletionCache {
        &self.cache
    }

    fn resolver(&self) -> ScheduleResolver {
        ScheduleResolver::with_default_project_days(self.config.default_project_days)
    }

    /// Resolve one test's schedule against its project's range.
    pub fn test_schedule(
        &self,
        project_ref: &str,
        test_id: i64,
        reference: NaiveDate,
    ) -> Option<TestSchedule> {
        let test = self.snapshot.test(project_ref, test_id)?;
        let range = self.snapshot.project(project_ref).and_then(|p| p.date_range);
        Some(self.resolver().resolve(test, range.as_ref(), reference))
    }

    /// Completion of a (project, group, test, date) occurrence.
    pub fn completion_status(
        &mut self,
        source: &dyn DataSource,
        key: &CompletionKey,
        force_refresh: bool,
    ) -> CompletionSummary {
        let mut aggregator =
            CompletionAggregator::new(source, &self.snapshot, &mut self.cache, &mut self.errors);
        aggregator.completion_status(key, force_refresh)
    }

    /// Animal totals across every due test and group of a project.
    pub fn animal_counts(
        &mut self,
        source: &dyn DataSource,
        project_ref: &str,
        date: NaiveDate,
    ) -> AnimalCounts {
        let resolver = self.resolver();
        let mut aggregator =
            CompletionAggregator::new(source, &self.snapshot, &mut self.cache, &mut self.errors);
        animal_counts(&mut aggregator, &resolver, project_ref, date)
    }

    /// Every (group, test) due on `date` across all projects.
    pub fn todays_tasks(&self, date: NaiveDate) -> Vec<TodayTask> {
        let resolver = self.resolver();
        let mut tasks = Vec::new();

        for project in self.snapshot.projects() {
            let project_ref = project.ref_num.as_str();
            for test in self.snapshot.tests(project_ref) {
                let schedule = resolver.resolve(test, project.date_range.as_ref(), date);
                if schedule.status != ScheduleStatus::Today {
                    continue;
                }
                for group in self.snapshot.groups(project_ref) {
                    tasks.push(TodayTask {
                        project_ref: project_ref.to_string(),
                        group_id: group.id,
                        group_name: group.name.clone(),
                        test_id: test.id,
                        test_name: test.name.clone(),
                    });
                }
            }
        }

        tasks
    }

    /// Board entries for one project tab.
    pub fn study_board(&mut self, source: &dyn DataSource, query: &BoardQuery) -> Vec<BoardEntry> {
        let resolver = self.resolver();
        let mut aggregator =
            CompletionAggregator::new(source, &self.snapshot, &mut self.cache, &mut self.errors);
        study_board(&mut aggregator, &resolver, query)
    }

    /// Entry sheet for one scheduled occurrence, pre-filled from captured data.
    pub fn capture_sheet(
        &self,
        source: &dyn DataSource,
        project_ref: &str,
        group_id: i64,
        test_id: i64,
        date: NaiveDate,
    ) -> CaptureResult<CaptureSheet> {
        let group = self
            .snapshot
            .group(project_ref, group_id)
            .ok_or(CaptureError::UnknownGroup(group_id))?;
        let test = self
            .snapshot
            .test(project_ref, test_id)
            .ok_or(CaptureError::UnknownTest(test_id))?;
        let schedule = self
            .test_schedule(project_ref, test_id, date)
            .ok_or(CaptureError::UnknownTest(test_id))?;

        let records = source.fetch_captured_records(project_ref)?;
        CaptureSheet::build(group, test, &schedule, date, &records)
    }

    /// Submit one measurement and drop the cached completion for `key`.
    pub fn submit_measurement(
        &mut self,
        source: &dyn DataSource,
        key: &CompletionKey,
        submission: &MeasurementSubmission,
    ) -> SourceResult<SubmissionAck> {
        let ack = source.submit_measurement(&key.project_ref, submission)?;
        if ack.accepted {
            self.cache.invalidate(key);
        }
        tracing::info!(
            project = %key.project_ref,
            group = key.group_id,
            test = key.test_id,
            accepted = ack.accepted,
            "measurement submitted"
        );
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::models::{Activity, Animal, CapturedRecord, CompletionStatus, Group, Sex, TestType};
    use crate::source::SourceError;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Default)]
    struct MockSource {
        fail_activities: bool,
        fail_groups_for: Option<&'static str>,
        fail_tests_for: Option<&'static str>,
        fail_records: Cell<bool>,
        record_fetches: Cell<usize>,
    }

    impl DataSource for MockSource {
        fn fetch_activities(&self) -> SourceResult<Vec<Activity>> {
            if self.fail_activities {
                return Err(SourceError::Unavailable("offline".into()));
            }
            Ok(vec![
                Activity::new("P1", "in progress"),
                Activity::new("P2", "completed"),
                Activity::new("P1", "completed"),
            ])
        }

        fn fetch_groups(&self, project_ref: &str) -> SourceResult<Vec<Group>> {
            if self.fail_groups_for == Some(project_ref) {
                return Err(SourceError::Status {
                    code: 500,
                    message: "boom".into(),
                });
            }
            let mut g1 = Group::new(1, "G1", "R");
            g1.male_animals = vec![Animal::new("M1", Sex::Male), Animal::new("M2", Sex::Male)];
            let empty = Group::new(2, "G2", "R");
            Ok(vec![g1, empty])
        }

        fn fetch_tests(&self, project_ref: &str) -> SourceResult<Vec<TestType>> {
            if self.fail_tests_for == Some(project_ref) {
                return Err(SourceError::Unavailable("tests offline".into()));
            }
            Ok(vec![
                TestType::new(10, "Body Weight", "D", 0),
                TestType::new(11, "Food Intake", "W", 0),
            ])
        }

        fn fetch_captured_records(&self, _project_ref: &str) -> SourceResult<Vec<CapturedRecord>> {
            self.record_fetches.set(self.record_fetches.get() + 1);
            if self.fail_records.get() {
                return Err(SourceError::Unavailable("timeout".into()));
            }
            Ok(vec![CapturedRecord::new(1, 10, "M1", "2025-06-02", "250")])
        }

        fn fetch_project_date_ranges(&self) -> SourceResult<Vec<ProjectDates>> {
            Ok(vec![ProjectDates::new("P1", "01-Jun-2025", Some("30-06-2025"))])
        }

        fn submit_measurement(
            &self,
            _project_ref: &str,
            _submission: &MeasurementSubmission,
        ) -> SourceResult<SubmissionAck> {
            Ok(SubmissionAck {
                accepted: true,
                record_id: Some("r1".into()),
                message: None,
            })
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            reference_date: Some(ymd(2025, 6, 2)),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_load_dedupes_activities() {
        let session = StudySession::load(&MockSource::default(), config());

        let refs: Vec<&str> = session.projects().iter().map(|p| p.ref_num.as_str()).collect();
        assert_eq!(refs, vec!["P1", "P2"]);
        assert!(session.projects()[0].date_range.is_some());
        assert!(session.projects()[1].date_range.is_none());
        assert!(session.load_error().is_none());
    }

    #[test]
    fn test_load_activity_failure() {
        let source = MockSource {
            fail_activities: true,
            ..MockSource::default()
        };
        let session = StudySession::load(&source, config());

        assert!(session.projects().is_empty());
        assert_eq!(session.load_error(), Some(LOAD_ERROR_MESSAGE));
    }

    #[test]
    fn test_group_failure_is_per_project() {
        let source = MockSource {
            fail_groups_for: Some("P2"),
            ..MockSource::default()
        };
        let session = StudySession::load(&source, config());

        assert_eq!(session.projects().len(), 2);
        assert!(session.errors().get("P2").unwrap().groups.is_some());
        assert!(session.errors().get("P1").is_none());
        assert_eq!(session.snapshot().groups("P1").len(), 2);
    }

    #[test]
    fn test_test_failure_is_per_project() {
        let source = MockSource {
            fail_tests_for: Some("P1"),
            ..MockSource::default()
        };
        let mut session = StudySession::load(&source, config());

        assert_eq!(session.projects().len(), 2);
        let errors = session.errors().get("P1").unwrap();
        assert!(errors.tests.is_some());
        assert!(errors.groups.is_none());
        assert!(session.errors().get("P2").is_none());
        assert!(session.snapshot().tests("P1").is_empty());
        assert_eq!(session.snapshot().groups("P1").len(), 2);
        assert_eq!(session.snapshot().tests("P2").len(), 2);

        assert!(session
            .todays_tasks(ymd(2025, 6, 2))
            .iter()
            .all(|t| t.project_ref != "P1"));

        let key = CompletionKey::new("P1", 1, 10, ymd(2025, 6, 2));
        let summary = session.completion_status(&source, &key, false);
        assert_eq!(summary.status, CompletionStatus::NotAssigned);
        assert_eq!(source.record_fetches.get(), 0);
    }

    #[test]
    fn test_completion_is_cached() {
        let source = MockSource::default();
        let mut session = StudySession::load(&source, config());
        let key = CompletionKey::new("P1", 1, 10, ymd(2025, 6, 2));

        let first = session.completion_status(&source, &key, false);
        let second = session.completion_status(&source, &key, false);
        assert_eq!(first, second);
        assert_eq!(first.status, CompletionStatus::Pending);
        assert_eq!((first.completed_count, first.total_count), (1, 2));
        assert_eq!(source.record_fetches.get(), 1);

        session.completion_status(&source, &key, true);
        assert_eq!(source.record_fetches.get(), 2);
    }

    #[test]
    fn test_empty_group_skips_fetch() {
        let source = MockSource::default();
        let mut session = StudySession::load(&source, config());
        let key = CompletionKey::new("P1", 2, 10, ymd(2025, 6, 2));

        let summary = session.completion_status(&source, &key, false);
        assert_eq!(summary.status, CompletionStatus::NotAssigned);
        assert_eq!(source.record_fetches.get(), 0);
    }

    #[test]
    fn test_record_failure_lands_in_error_bag() {
        let source = MockSource::default();
        source.fail_records.set(true);
        let mut session = StudySession::load(&source, config());
        let key = CompletionKey::new("P1", 1, 10, ymd(2025, 6, 2));

        let summary = session.completion_status(&source, &key, false);
        assert_eq!(summary.completed_count, 0);
        assert!(session.errors().get("P1").unwrap().records.is_some());

        source.fail_records.set(false);
        let summary = session.completion_status(&source, &key, true);
        assert_eq!(summary.completed_count, 1);
        assert!(session.errors().get("P1").is_none());
    }

    #[test]
    fn test_todays_tasks() {
        let session = StudySession::load(&MockSource::default(), config());

        // 2025-06-02: daily test due, weekly test is not (01, 08, ...)
        let tasks: Vec<(String, i64, i64)> = session
            .todays_tasks(ymd(2025, 6, 2))
            .into_iter()
            .filter(|t| t.project_ref == "P1")
            .map(|t| (t.project_ref, t.group_id, t.test_id))
            .collect();
        assert_eq!(
            tasks,
            vec![("P1".to_string(), 1, 10), ("P1".to_string(), 2, 10)]
        );
    }

    #[test]
    fn test_animal_counts() {
        let source = MockSource::default();
        let mut session = StudySession::load(&source, config());

        let counts = session.animal_counts(&source, "P1", ymd(2025, 6, 2));
        assert_eq!(counts.total_animals, 2);
        assert_eq!(counts.completed_animals, 1);
        assert_eq!(counts.pending_animals, 1);
    }

    #[test]
    fn test_submit_invalidates_cache_entry() {
        let source = MockSource::default();
        let mut session = StudySession::load(&source, config());
        let key = CompletionKey::new("P1", 1, 10, ymd(2025, 6, 2));
        session.completion_status(&source, &key, false);
        assert_eq!(session.cache().len(), 1);

        let sheet = session
            .capture_sheet(&source, "P1", 1, 10, ymd(2025, 6, 2))
            .unwrap();
        let mut edited = sheet.rows.clone();
        edited[1].set_value(10, "260");
        let submission = sheet
            .pending_submissions(&edited, ymd(2025, 6, 2).and_hms_opt(8, 30, 0).unwrap(), "ok")
            .remove(0);

        let ack = session.submit_measurement(&source, &key, &submission).unwrap();
        assert!(ack.accepted);
        assert!(session.cache().is_empty());
    }

    #[test]
    fn test_overdue_board() {
        let source = MockSource::default();
        let mut session = StudySession::load(&source, config());
        let query = BoardQuery::new("P1", BoardTab::Overdue, ymd(2025, 6, 3));

        let entries = session.study_board(&source, &query);
        // Daily test: 06-01 and 06-02 for G1 are pending; G2 is not assigned.
        // Weekly test: 06-01 for G1 pending.
        assert_eq!(entries.len(), 3);
        assert!(entries
            .iter()
            .all(|e| e.completion.status == CompletionStatus::Pending && e.group_id == 1));
    }
}
