//! GLP Study Core Library
//!
//! Scheduling and data-capture completion engine for laboratory animal
//! studies, shared by the mobile apps through UniFFI.
//!
//! # Architecture
//!
//! ```text
//! Collaborator API / Local store (DataSource)
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │ StudySession │  activities → canonical projects → groups + tests
//!     └──────┬───────┘
//!            │
//!   ┌────────┼─────────────────┬──────────────────┐
//!   │        │                 │                  │
//!   ▼        ▼                 ▼                  ▼
//! Schedule  Completion      Study board      Capture sheet
//! Resolver  Aggregator      (Today/Upcoming/ (pre-filled rows,
//! (D/W/O/   (cache +        Overdue/         ADD/UPDATE
//!  B/N)      error bag)     Completed)       submissions)
//!            │
//!            ▼
//!      Animal-count rollup
//! ```
//!
//! # Core Principle
//!
//! **Fetch failures never abort a load.** They are recorded per project and
//! the affected occurrence reports zero captured animals.
//!
//! # Modules
//!
//! - [`schedule`]: Date normalization and test schedule resolution
//! - [`completion`]: Completion aggregator, cache and animal-count rollup
//! - [`session`]: Loaded study state, error bag and study board
//! - [`capture`]: Capture sheets and submission payloads
//! - [`source`]: Data collaborator contract
//! - [`db`]: SQLite local store implementing the collaborator contract
//! - [`models`]: Domain types (Activity, Group, TestType, etc.)
//! - [`config`]: Engine configuration
//! - [`logging`]: tracing subscriber setup

pub mod capture;
pub mod completion;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod schedule;
pub mod session;
pub mod source;

// Re-export commonly used types
pub use capture::{CaptureError, CaptureRow, CaptureSheet};
pub use completion::{AnimalCounts, CompletionAggregator, CompletionCache};
pub use config::EngineConfig;
pub use db::Database;
pub use models::{
    Activity, CapturedRecord, CompletionKey, CompletionStatus, CompletionSummary, Group,
    MeasurementSubmission, Project, TestType,
};
pub use schedule::{normalize_date, ScheduleResolver, ScheduleStatus, TestSchedule};
pub use session::{BoardEntry, BoardQuery, BoardTab, StudySession};
pub use source::{DataSource, SourceError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use models::{ActivityList, ProjectDates, SubmissionAck};
use schedule::format_iso;
use session::TodayTask;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum GlpStudyError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Source error: {0}")]
    SourceError(String),
}

impl From<db::DbError> for GlpStudyError {
    fn from(e: db::DbError) -> Self {
        GlpStudyError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for GlpStudyError {
    fn from(e: serde_json::Error) -> Self {
        GlpStudyError::SerializationError(e.to_string())
    }
}

impl From<source::SourceError> for GlpStudyError {
    fn from(e: source::SourceError) -> Self {
        GlpStudyError::SourceError(e.to_string())
    }
}

impl From<config::ConfigError> for GlpStudyError {
    fn from(e: config::ConfigError) -> Self {
        GlpStudyError::InvalidInput(e.to_string())
    }
}

impl From<CaptureError> for GlpStudyError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::NotScheduled { .. } => GlpStudyError::InvalidInput(e.to_string()),
            CaptureError::UnknownGroup(_) | CaptureError::UnknownTest(_) => {
                GlpStudyError::NotFound(e.to_string())
            }
            CaptureError::Source(inner) => inner.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for GlpStudyError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        GlpStudyError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, GlpStudyError> {
    normalize_date(raw)
        .ok_or_else(|| GlpStudyError::InvalidInput(format!("Unrecognized date: {raw}")))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a local store at the given path.
#[uniffi::export]
pub fn open_store(path: String) -> Result<Arc<GlpStudyCore>, GlpStudyError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(GlpStudyCore::new(db)))
}

/// Create an in-memory store.
#[uniffi::export]
pub fn open_store_in_memory() -> Result<Arc<GlpStudyCore>, GlpStudyError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(GlpStudyCore::new(db)))
}

/// Install the crate's log subscriber. Returns false if one is already set.
#[uniffi::export]
pub fn enable_logging(filter: Option<String>) -> bool {
    logging::init_logging(filter.as_deref())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine wrapper for FFI.
///
/// Locks are always taken store first, then session.
#[derive(uniffi::Object)]
pub struct GlpStudyCore {
    db: Arc<Mutex<Database>>,
    session: Arc<Mutex<StudySession>>,
}

impl GlpStudyCore {
    fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            session: Arc::new(Mutex::new(StudySession::empty(EngineConfig::default()))),
        }
    }
}

#[uniffi::export]
impl GlpStudyCore {
    // =========================================================================
    // Configuration
    // =========================================================================

    /// Apply a JSON engine configuration.
    pub fn configure(&self, config_json: String) -> Result<(), GlpStudyError> {
        let config = EngineConfig::from_json(&config_json)?;
        let mut session = self.session.lock()?;
        session.set_config(config);
        Ok(())
    }

    // =========================================================================
    // Ingest (collaborator payloads into the local store)
    // =========================================================================

    /// Store the activity list envelope (`{"a_list": [...]}`).
    pub fn ingest_activities(&self, json: String) -> Result<u32, GlpStudyError> {
        let list: ActivityList = serde_json::from_str(&json)?;
        let db = self.db.lock()?;
        db.replace_activities(&list.a_list)?;
        Ok(list.a_list.len() as u32)
    }

    /// Store project start/end dates (JSON array).
    pub fn ingest_project_dates(&self, json: String) -> Result<u32, GlpStudyError> {
        let dates: Vec<ProjectDates> = serde_json::from_str(&json)?;
        let db = self.db.lock()?;
        db.upsert_project_dates(&dates)?;
        Ok(dates.len() as u32)
    }

    /// Replace a project's groups (JSON array).
    pub fn ingest_groups(&self, project_ref: String, json: String) -> Result<u32, GlpStudyError> {
        let groups: Vec<Group> = serde_json::from_str(&json)?;
        let db = self.db.lock()?;
        db.replace_groups(&project_ref, &groups)?;
        Ok(groups.len() as u32)
    }

    /// Replace a project's tests (JSON array).
    pub fn ingest_tests(&self, project_ref: String, json: String) -> Result<u32, GlpStudyError> {
        let tests: Vec<TestType> = serde_json::from_str(&json)?;
        let db = self.db.lock()?;
        db.replace_tests(&project_ref, &tests)?;
        Ok(tests.len() as u32)
    }

    /// Replace a project's captured records (JSON array). Returns the number stored.
    pub fn ingest_captured_records(
        &self,
        project_ref: String,
        json: String,
    ) -> Result<u32, GlpStudyError> {
        let records: Vec<CapturedRecord> = serde_json::from_str(&json)?;
        let db = self.db.lock()?;
        let stored = db.replace_captured_records(&project_ref, &records)?;
        Ok(stored as u32)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Reload projects from the store and clear cached completion.
    pub fn refresh_session(&self) -> Result<FfiSessionSummary, GlpStudyError> {
        let db = self.db.lock()?;
        let mut session = self.session.lock()?;
        session.reload(&*db);
        Ok(FfiSessionSummary {
            project_count: session.projects().len() as u32,
            failed_projects: session.errors().len() as u32,
            load_error: session.load_error().map(str::to_string),
        })
    }

    /// Loaded projects with any per-project fetch failures.
    pub fn projects(&self) -> Result<Vec<FfiProject>, GlpStudyError> {
        let session = self.session.lock()?;
        Ok(session
            .projects()
            .iter()
            .map(|p| FfiProject::new(p, session.errors().get(&p.ref_num)))
            .collect())
    }

    // =========================================================================
    // Schedule and Completion
    // =========================================================================

    /// Resolve a test's schedule. `date` defaults to the reference date.
    pub fn test_schedule(
        &self,
        project_ref: String,
        test_id: i64,
        date: Option<String>,
    ) -> Result<Option<FfiTestSchedule>, GlpStudyError> {
        let session = self.session.lock()?;
        let reference = match date {
            Some(raw) => parse_date(&raw)?,
            None => session.reference_date(),
        };
        Ok(session
            .test_schedule(&project_ref, test_id, reference)
            .map(Into::into))
    }

    /// Completion of one occurrence.
    pub fn completion_status(
        &self,
        project_ref: String,
        group_id: i64,
        test_id: i64,
        date: String,
        force_refresh: bool,
    ) -> Result<FfiCompletionSummary, GlpStudyError> {
        let date = parse_date(&date)?;
        let db = self.db.lock()?;
        let mut session = self.session.lock()?;
        let key = CompletionKey::new(project_ref, group_id, test_id, date);
        Ok(session.completion_status(&*db, &key, force_refresh).into())
    }

    /// Animal totals for a project on a date (reference date by default).
    pub fn animal_counts(
        &self,
        project_ref: String,
        date: Option<String>,
    ) -> Result<FfiAnimalCounts, GlpStudyError> {
        let db = self.db.lock()?;
        let mut session = self.session.lock()?;
        let date = match date {
            Some(raw) => parse_date(&raw)?,
            None => session.reference_date(),
        };
        Ok(session.animal_counts(&*db, &project_ref, date).into())
    }

    /// Tests due today across all projects.
    pub fn todays_tasks(&self, date: Option<String>) -> Result<Vec<FfiTodayTask>, GlpStudyError> {
        let session = self.session.lock()?;
        let date = match date {
            Some(raw) => parse_date(&raw)?,
            None => session.reference_date(),
        };
        Ok(session.todays_tasks(date).into_iter().map(Into::into).collect())
    }

    /// Board entries for one tab ("Today", "Upcoming", "Overdue", "Completed").
    pub fn study_board(
        &self,
        project_ref: String,
        tab: String,
        group_id: Option<i64>,
        test_id: Option<i64>,
        date: Option<String>,
    ) -> Result<Vec<FfiBoardEntry>, GlpStudyError> {
        let tab = BoardTab::parse(&tab)
            .ok_or_else(|| GlpStudyError::InvalidInput(format!("Unknown board tab: {tab}")))?;
        let db = self.db.lock()?;
        let mut session = self.session.lock()?;
        let reference = match date {
            Some(raw) => parse_date(&raw)?,
            None => session.reference_date(),
        };

        let mut query = BoardQuery::new(project_ref, tab, reference);
        query.group_id = group_id;
        query.test_id = test_id;
        Ok(session
            .study_board(&*db, &query)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Capture sheet for an occurrence, as JSON.
    pub fn capture_sheet_json(
        &self,
        project_ref: String,
        group_id: i64,
        test_id: i64,
        date: String,
    ) -> Result<String, GlpStudyError> {
        let date = parse_date(&date)?;
        let db = self.db.lock()?;
        let session = self.session.lock()?;
        let sheet = session.capture_sheet(&*db, &project_ref, group_id, test_id, date)?;
        Ok(serde_json::to_string(&sheet)?)
    }

    /// Submit the changed cells of edited capture rows (JSON array of rows).
    pub fn submit_capture(
        &self,
        project_ref: String,
        group_id: i64,
        test_id: i64,
        date: String,
        edited_rows_json: String,
    ) -> Result<Vec<FfiSubmissionAck>, GlpStudyError> {
        let date = parse_date(&date)?;
        let edited: Vec<CaptureRow> = serde_json::from_str(&edited_rows_json)?;
        let db = self.db.lock()?;
        let mut session = self.session.lock()?;

        let sheet = session.capture_sheet(&*db, &project_ref, group_id, test_id, date)?;
        let submissions = sheet.pending_submissions(
            &edited,
            chrono::Local::now().naive_local(),
            &session.config().default_remarks,
        );

        let key = CompletionKey::new(project_ref, group_id, test_id, date);
        let mut acks = Vec::with_capacity(submissions.len());
        for submission in &submissions {
            acks.push(session.submit_measurement(&*db, &key, submission)?.into());
        }
        Ok(acks)
    }

    /// Submit one prepared measurement (JSON). `parent_test_id` names the
    /// test whose cached completion is dropped.
    pub fn record_submission(
        &self,
        project_ref: String,
        parent_test_id: i64,
        submission_json: String,
    ) -> Result<FfiSubmissionAck, GlpStudyError> {
        let submission: MeasurementSubmission = serde_json::from_str(&submission_json)?;
        let date = submission.date().ok_or_else(|| {
            GlpStudyError::InvalidInput(format!("Unrecognized date: {}", submission.test_date))
        })?;

        let db = self.db.lock()?;
        let mut session = self.session.lock()?;
        let key = CompletionKey::new(project_ref, submission.group_id, parent_test_id, date);
        Ok(session.submit_measurement(&*db, &key, &submission)?.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe load outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSessionSummary {
    pub project_count: u32,
    pub failed_projects: u32,
    pub load_error: Option<String>,
}

/// FFI-safe project.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProject {
    pub ref_num: String,
    pub title: String,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub groups_error: Option<String>,
    pub tests_error: Option<String>,
    pub records_error: Option<String>,
}

impl FfiProject {
    fn new(project: &Project, errors: Option<&session::ProjectErrors>) -> Self {
        let errors = errors.cloned().unwrap_or_default();
        Self {
            ref_num: project.ref_num.clone(),
            title: project.title.clone(),
            status: format!("{:?}", project.status),
            start_date: project.date_range.map(|r| format_iso(r.start)),
            end_date: project.date_range.map(|r| format_iso(r.end)),
            groups_error: errors.groups,
            tests_error: errors.tests,
            records_error: errors.records,
        }
    }
}

/// FFI-safe test schedule.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTestSchedule {
    pub status: String,
    pub schedule_dates: Vec<String>,
    pub frequency_label: String,
    pub test_start_date: Option<String>,
    pub next_schedule_date: Option<String>,
}

impl From<TestSchedule> for FfiTestSchedule {
    fn from(schedule: TestSchedule) -> Self {
        Self {
            status: schedule.status.as_str().to_string(),
            schedule_dates: schedule.schedule_dates.into_iter().map(format_iso).collect(),
            frequency_label: schedule.frequency_label,
            test_start_date: schedule.test_start_date.map(format_iso),
            next_schedule_date: schedule.next_schedule_date.map(format_iso),
        }
    }
}

/// FFI-safe completion summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCompletionSummary {
    pub status: String,
    pub completed_count: u32,
    pub total_count: u32,
    pub animal_name: String,
}

impl From<CompletionSummary> for FfiCompletionSummary {
    fn from(summary: CompletionSummary) -> Self {
        Self {
            status: summary.status.as_str().to_string(),
            completed_count: summary.completed_count,
            total_count: summary.total_count,
            animal_name: summary.animal_name,
        }
    }
}

/// FFI-safe animal counts.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAnimalCounts {
    pub total_animals: u32,
    pub completed_animals: u32,
    pub pending_animals: u32,
}

impl From<AnimalCounts> for FfiAnimalCounts {
    fn from(counts: AnimalCounts) -> Self {
        Self {
            total_animals: counts.total_animals,
            completed_animals: counts.completed_animals,
            pending_animals: counts.pending_animals,
        }
    }
}

/// FFI-safe task due today.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTodayTask {
    pub project_ref: String,
    pub group_id: i64,
    pub group_name: String,
    pub test_id: i64,
    pub test_name: String,
}

impl From<TodayTask> for FfiTodayTask {
    fn from(task: TodayTask) -> Self {
        Self {
            project_ref: task.project_ref,
            group_id: task.group_id,
            group_name: task.group_name,
            test_id: task.test_id,
            test_name: task.test_name,
        }
    }
}

/// FFI-safe board entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBoardEntry {
    pub group_id: i64,
    pub group_name: String,
    pub test_id: i64,
    pub test_name: String,
    pub frequency_label: String,
    pub tab: String,
    pub status: Option<String>,
    pub schedule_date: String,
    pub completion: FfiCompletionSummary,
}

impl From<BoardEntry> for FfiBoardEntry {
    fn from(entry: BoardEntry) -> Self {
        Self {
            group_id: entry.group_id,
            group_name: entry.group_name,
            test_id: entry.test_id,
            test_name: entry.test_name,
            frequency_label: entry.frequency_label,
            tab: entry.tab.as_str().to_string(),
            status: entry.status.map(|s| s.as_str().to_string()),
            schedule_date: format_iso(entry.schedule_date),
            completion: entry.completion.into(),
        }
    }
}

/// FFI-safe submission acknowledgement.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSubmissionAck {
    pub accepted: bool,
    pub record_id: Option<String>,
    pub message: Option<String>,
}

impl From<SubmissionAck> for FfiSubmissionAck {
    fn from(ack: SubmissionAck) -> Self {
        Self {
            accepted: ack.accepted,
            record_id: ack.record_id,
            message: ack.message,
        }
    }
}
