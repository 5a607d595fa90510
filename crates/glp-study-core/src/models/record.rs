//! Captured measurement records and submission payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{opt_string_or_number, string_or_number, SubType};
use crate::schedule::normalize_date;

/// Remarks used when the operator leaves the field empty.
pub const DEFAULT_SUBMISSION_REMARKS: &str = "Data captured via mobile app";

/// A measurement already captured for an animal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapturedRecord {
    /// Local record ID (assigned by the local store)
    #[serde(default)]
    pub record_id: Option<String>,
    /// Group the animal belongs to
    pub group_id: i64,
    /// Test or sub-type identifier
    pub test_type_id: i64,
    /// Sub-type name, when the record belongs to a sub-measurement
    #[serde(default)]
    pub test_sub_type: Option<String>,
    /// Animal identifier
    #[serde(rename = "rat_no", deserialize_with = "string_or_number")]
    pub animal_id: String,
    /// Capture date in any collaborator format
    pub test_date: String,
    /// Captured value
    #[serde(rename = "t_value", default, deserialize_with = "opt_string_or_number")]
    pub value: Option<String>,
    /// Free-text remarks
    #[serde(default)]
    pub remarks: Option<String>,
}

impl CapturedRecord {
    /// Create a record with a value.
    pub fn new(
        group_id: i64,
        test_type_id: i64,
        animal_id: impl Into<String>,
        test_date: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            record_id: None,
            group_id,
            test_type_id,
            test_sub_type: None,
            animal_id: animal_id.into(),
            test_date: test_date.into(),
            value: Some(value.into()),
            remarks: None,
        }
    }

    /// Normalized capture date.
    pub fn date(&self) -> Option<NaiveDate> {
        normalize_date(&self.test_date)
    }

    /// True when the value is present and not blank.
    pub fn has_value(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    /// Whether this record holds the given sub-measurement.
    pub fn matches_sub_type(&self, sub_type: &SubType) -> bool {
        self.test_type_id == sub_type.id
            && self
                .test_sub_type
                .as_deref()
                .map_or(true, |name| name == sub_type.name)
    }
}

/// Whether a submission adds a new value or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallMode {
    #[serde(rename = "ADD_TEST")]
    Add,
    #[serde(rename = "UPDATE_TEST")]
    Update,
}

/// Payload for the "submit measurement" call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementSubmission {
    /// Test or sub-type identifier
    pub test_type_id: i64,
    /// Add or update
    pub call_mode: CallMode,
    /// Group identifier
    pub group_id: i64,
    /// Test or sub-type name
    pub test_name: String,
    /// Animal identifier
    pub rat_no: String,
    /// Capture time, `hh:mm AM`
    pub test_time: String,
    /// Scheduled date, `DD-MM-YYYY`
    pub test_date: String,
    /// Value as entered
    pub test_value: String,
    /// Remarks
    pub remarks: String,
}

impl MeasurementSubmission {
    /// Normalized scheduled date of the submission.
    pub fn date(&self) -> Option<NaiveDate> {
        normalize_date(&self.test_date)
    }
}

/// Acknowledgement of a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionAck {
    /// Whether the collaborator accepted the measurement
    pub accepted: bool,
    /// Identifier of the stored record, when known
    pub record_id: Option<String>,
    /// Collaborator message
    pub message: Option<String>,
}
