//! Project models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{string_or_number, Activity, ActivityStatus, Group};
use crate::schedule::{normalize_date, shift_days};

/// Project length assumed when the API gives no end date.
pub const DEFAULT_PROJECT_DAYS: i64 = 30;

/// Upper bound on an inferred project length (about a century).
pub const MAX_PROJECT_DAYS: i64 = 36_500;

/// Raw project date range as returned by the project list call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDates {
    /// Project code (same value as an activity's `ref_num`)
    #[serde(alias = "ref_num", deserialize_with = "string_or_number")]
    pub project_code: String,
    /// Start date in any collaborator format
    #[serde(default)]
    pub start_date: Option<String>,
    /// End date in any collaborator format
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ProjectDates {
    pub fn new(project_code: impl Into<String>, start: &str, end: Option<&str>) -> Self {
        Self {
            project_code: project_code.into(),
            start_date: Some(start.to_string()),
            end_date: end.map(str::to_string),
        }
    }

    /// Normalized range; `None` when the start date is missing or malformed.
    pub fn to_range(&self, default_days: i64) -> Option<DateRange> {
        let start = self.start_date.as_deref().and_then(normalize_date)?;
        let end = self.end_date.as_deref().and_then(normalize_date);
        Some(DateRange::new(start, end, default_days))
    }
}

/// Inclusive calendar date range. Always `start <= end`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, inferring a missing end as `start + default_days` and
    /// clamping an end that precedes the start. `default_days` is clamped to
    /// `0..=MAX_PROJECT_DAYS`.
    pub fn new(start: NaiveDate, end: Option<NaiveDate>, default_days: i64) -> Self {
        let end = end
            .or_else(|| shift_days(start, default_days.clamp(0, MAX_PROJECT_DAYS)))
            .unwrap_or(start)
            .max(start);
        Self { start, end }
    }

    /// Synthetic range anchored at a reference date.
    pub fn synthetic(reference: NaiveDate, default_days: i64) -> Self {
        Self::new(reference, None, default_days)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both endpoints included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// A study project assembled from its activity, dates and groups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Project reference number / project code
    pub ref_num: String,
    /// Display title
    pub title: String,
    /// Status of the canonical activity
    pub status: ActivityStatus,
    /// Date range, if the API supplied a usable start date
    pub date_range: Option<DateRange>,
}

impl Project {
    /// Assemble a project. The title prefers the first group's project title,
    /// then the activity title, then the reference number.
    pub fn assemble(
        activity: &Activity,
        dates: Option<&ProjectDates>,
        groups: &[Group],
        default_days: i64,
    ) -> Self {
        let title = groups
            .first()
            .and_then(|g| g.project_title.clone())
            .filter(|t| !t.trim().is_empty())
            .or_else(|| activity.title.clone())
            .unwrap_or_else(|| activity.ref_num.clone());

        Self {
            ref_num: activity.ref_num.clone(),
            title,
            status: activity.status_kind(),
            date_range: dates.and_then(|d| d.to_range(default_days)),
        }
    }
}
