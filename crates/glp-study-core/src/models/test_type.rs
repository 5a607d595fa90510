//! Test type models.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// How a test's due dates are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// `D`: every day from the test start through project end
    Daily,
    /// `W`: every 7 days from the test start through project end
    Weekly,
    /// `O`: once, at project end
    OnceAtEnd,
    /// `B`: once, the day before project start
    BeforeStart,
    /// `N`: explicit comma-separated date list
    DateSchedule,
    /// Any other code; never scheduled
    Unknown,
}

impl Frequency {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "D" => Frequency::Daily,
            "W" => Frequency::Weekly,
            "O" => Frequency::OnceAtEnd,
            "B" => Frequency::BeforeStart,
            "N" => Frequency::DateSchedule,
            _ => Frequency::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::OnceAtEnd => "One Time at the End",
            Frequency::BeforeStart => "One Time Before Start",
            Frequency::DateSchedule => "As per the Date schedule",
            Frequency::Unknown => "Unknown",
        }
    }
}

/// A named sub-measurement within a test (e.g. one blood panel component).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubType {
    /// Identifier captured records refer to
    pub id: i64,
    /// Sub-type name
    #[serde(rename = "test_sub_type", default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Measurement unit
    #[serde(default)]
    pub unit: Option<String>,
    /// Normal range, free text (e.g. "4.0-10.0")
    #[serde(default)]
    pub normal_range: Option<String>,
}

impl SubType {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            unit: None,
            normal_range: None,
        }
    }
}

/// A test scheduled within a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestType {
    /// Test identifier
    pub id: i64,
    /// Test name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Owning project code
    #[serde(default)]
    pub project_code: Option<String>,
    /// Frequency code (D, W, O, B, N)
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_frequency: String,
    /// Offset in days from project start
    #[serde(default, deserialize_with = "null_as_default")]
    pub no_of_days: i64,
    /// Explicit comma-separated dates for `N` tests
    #[serde(default)]
    pub date_schedule: Option<String>,
    /// Whether every sub-type must be filled for completion
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_sub_type_applicable: bool,
    /// Sub-measurements
    #[serde(rename = "test_sub_type_list", default, deserialize_with = "null_as_default")]
    pub sub_types: Vec<SubType>,
}

impl TestType {
    /// Create a test with a frequency code and offset.
    pub fn new(id: i64, name: impl Into<String>, frequency_code: &str, no_of_days: i64) -> Self {
        Self {
            id,
            name: name.into(),
            project_code: None,
            test_frequency: frequency_code.to_string(),
            no_of_days,
            date_schedule: None,
            is_sub_type_applicable: false,
            sub_types: Vec::new(),
        }
    }

    pub fn frequency(&self) -> Frequency {
        Frequency::from_code(&self.test_frequency)
    }

    /// A test flagged for sub-types but carrying none is treated as plain.
    pub fn requires_sub_types(&self) -> bool {
        self.is_sub_type_applicable && !self.sub_types.is_empty()
    }
}
