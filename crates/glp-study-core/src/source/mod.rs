//! Data collaborators consumed by the engine.
//!
//! The engine never talks HTTP itself. Whatever owns the network (the host
//! app, the local store, a test double) implements [`DataSource`].

use thiserror::Error;

use crate::db::DbError;
use crate::models::{
    Activity, CapturedRecord, Group, MeasurementSubmission, ProjectDates, SubmissionAck, TestType,
};

/// Data source errors.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request failed with status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Local store error: {0}")]
    Store(#[from] DbError),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Collaborator contract for fetching study data and submitting measurements.
pub trait DataSource {
    /// All activities, duplicates included.
    fn fetch_activities(&self) -> SourceResult<Vec<Activity>>;

    /// Groups of one project.
    fn fetch_groups(&self, project_ref: &str) -> SourceResult<Vec<Group>>;

    /// Tests of one project.
    fn fetch_tests(&self, project_ref: &str) -> SourceResult<Vec<TestType>>;

    /// Every captured record of one project.
    fn fetch_captured_records(&self, project_ref: &str) -> SourceResult<Vec<CapturedRecord>>;

    /// Start/end dates of all projects.
    fn fetch_project_date_ranges(&self) -> SourceResult<Vec<ProjectDates>>;

    /// Persist one measurement.
    fn submit_measurement(
        &self,
        project_ref: &str,
        submission: &MeasurementSubmission,
    ) -> SourceResult<SubmissionAck>;
}
