//! The local store as a data source.

use super::Database;
use crate::models::{
    Activity, CapturedRecord, Group, MeasurementSubmission, ProjectDates, SubmissionAck, TestType,
};
use crate::source::{DataSource, SourceResult};

impl DataSource for Database {
    fn fetch_activities(&self) -> SourceResult<Vec<Activity>> {
        Ok(self.list_activities()?)
    }

    fn fetch_groups(&self, project_ref: &str) -> SourceResult<Vec<Group>> {
        Ok(self.list_groups(project_ref)?)
    }

    fn fetch_tests(&self, project_ref: &str) -> SourceResult<Vec<TestType>> {
        Ok(self.list_tests(project_ref)?)
    }

    fn fetch_captured_records(&self, project_ref: &str) -> SourceResult<Vec<CapturedRecord>> {
        Ok(self.list_captured_records(project_ref)?)
    }

    fn fetch_project_date_ranges(&self) -> SourceResult<Vec<ProjectDates>> {
        Ok(self.list_project_dates()?)
    }

    fn submit_measurement(
        &self,
        project_ref: &str,
        submission: &MeasurementSubmission,
    ) -> SourceResult<SubmissionAck> {
        let (record_id, replaced) = self.record_submission(project_ref, submission)?;
        Ok(SubmissionAck {
            accepted: true,
            record_id: Some(record_id),
            message: Some(if replaced { "Updated" } else { "Added" }.to_string()),
        })
    }
}
