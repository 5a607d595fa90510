//! Engine configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DEFAULT_PROJECT_DAYS, DEFAULT_SUBMISSION_REMARKS, MAX_PROJECT_DAYS};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Engine settings supplied by the host app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Fixed "today" for demos and tests; the local date when unset
    pub reference_date: Option<NaiveDate>,
    /// Project length assumed when no end date is known
    pub default_project_days: i64,
    /// Remarks sent when the operator leaves the field empty
    pub default_remarks: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_date: None,
            default_project_days: DEFAULT_PROJECT_DAYS,
            default_remarks: DEFAULT_SUBMISSION_REMARKS.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=MAX_PROJECT_DAYS).contains(&self.default_project_days) {
            return Err(ConfigError::Invalid(format!(
                "default_project_days must be within 0..={MAX_PROJECT_DAYS}, got {}",
                self.default_project_days
            )));
        }
        Ok(())
    }

    /// Date statuses are computed against.
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
