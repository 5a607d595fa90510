//! Test schedule resolution.
//!
//! Due-date rules per frequency code:
//! - `D`: every day from `start + offset` through `end`
//! - `W`: every 7 days from `start + offset` through `end`
//! - `O`: project end
//! - `B`: the day before project start
//! - `N`: explicit dates within `[start, end]`

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{parse_date_list, shift_days};
use crate::models::{DateRange, Frequency, TestType, DEFAULT_PROJECT_DAYS};

/// Relationship between a reference date and a test's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Today,
    Yesterday,
    Tomorrow,
    Overdue,
    Upcoming,
    None,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Today => "Today",
            ScheduleStatus::Yesterday => "Yesterday",
            ScheduleStatus::Tomorrow => "Tomorrow",
            ScheduleStatus::Overdue => "Overdue",
            ScheduleStatus::Upcoming => "Upcoming",
            ScheduleStatus::None => "None",
        }
    }
}

/// Resolved schedule of a test relative to a reference date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestSchedule {
    pub status: ScheduleStatus,
    /// Sorted, deduplicated due dates
    pub schedule_dates: Vec<NaiveDate>,
    pub frequency_label: String,
    /// First due date
    pub test_start_date: Option<NaiveDate>,
    /// First due date strictly after the reference date
    pub next_schedule_date: Option<NaiveDate>,
}

impl TestSchedule {
    pub fn is_scheduled(&self, date: NaiveDate) -> bool {
        self.schedule_dates.binary_search(&date).is_ok()
    }

    /// Due dates strictly before `reference`.
    pub fn past_dates(&self, reference: NaiveDate) -> impl Iterator<Item = NaiveDate> + '_ {
        self.schedule_dates.iter().copied().take_while(move |d| *d < reference)
    }
}

/// Compute the due dates of a test within a project range.
pub fn schedule_dates(test: &TestType, range: &DateRange) -> Vec<NaiveDate> {
    match test.frequency() {
        Frequency::Daily => stepped_dates(range, test.no_of_days, 1),
        Frequency::Weekly => stepped_dates(range, test.no_of_days, 7),
        Frequency::OnceAtEnd => vec![range.end],
        Frequency::BeforeStart => shift_days(range.start, -1).into_iter().collect(),
        Frequency::DateSchedule => {
            let listed: BTreeSet<NaiveDate> = test
                .date_schedule
                .as_deref()
                .map(parse_date_list)
                .unwrap_or_default()
                .into_iter()
                .filter(|d| range.contains(*d))
                .collect();
            listed.into_iter().collect()
        }
        Frequency::Unknown => Vec::new(),
    }
}

/// Dates from `start + offset` through `end`, every `step` days.
/// Negative offsets are treated as zero.
fn stepped_dates(range: &DateRange, offset: i64, step: i64) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = shift_days(range.start, offset.max(0));

    while let Some(date) = current {
        if date > range.end {
            break;
        }
        dates.push(date);
        current = shift_days(date, step);
    }

    dates
}

/// Classify a reference date against sorted due dates.
///
/// An exact match wins over a neighbouring one, and yesterday's occurrence
/// wins over tomorrow's.
pub fn classify(dates: &[NaiveDate], reference: NaiveDate) -> ScheduleStatus {
    let scheduled = |offset: i64| {
        shift_days(reference, offset).is_some_and(|d| dates.binary_search(&d).is_ok())
    };

    if scheduled(0) {
        ScheduleStatus::Today
    } else if scheduled(-1) {
        ScheduleStatus::Yesterday
    } else if scheduled(1) {
        ScheduleStatus::Tomorrow
    } else {
        ScheduleStatus::None
    }
}

/// Resolves test schedules against project date ranges.
#[derive(Debug, Clone)]
pub struct ScheduleResolver {
    /// Project length used when a range has to be synthesized
    default_project_days: i64,
}

impl Default for ScheduleResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleResolver {
    pub fn new() -> Self {
        Self {
            default_project_days: DEFAULT_PROJECT_DAYS,
        }
    }

    pub fn with_default_project_days(default_project_days: i64) -> Self {
        Self {
            default_project_days,
        }
    }

    /// Resolve a test's schedule. A missing range is replaced by a synthetic
    /// one starting at the reference date.
    pub fn resolve(
        &self,
        test: &TestType,
        range: Option<&DateRange>,
        reference: NaiveDate,
    ) -> TestSchedule {
        let range = range
            .copied()
            .unwrap_or_else(|| DateRange::synthetic(reference, self.default_project_days));

        let dates = schedule_dates(test, &range);
        let status = classify(&dates, reference);
        let next_schedule_date = dates.iter().copied().find(|d| *d > reference);

        tracing::debug!(
            test_id = test.id,
            frequency = %test.test_frequency,
            dates = dates.len(),
            status = status.as_str(),
            "resolved test schedule"
        );

        TestSchedule {
            status,
            test_start_date: dates.first().copied(),
            next_schedule_date,
            frequency_label: test.frequency().label().to_string(),
            schedule_dates: dates,
        }
    }
}
