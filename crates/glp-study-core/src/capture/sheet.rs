//! Capture sheet for one group, test and date.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{CaptureError, CaptureResult};
use crate::models::{CallMode, CapturedRecord, Group, MeasurementSubmission, TestType};
use crate::schedule::{format_submission, TestSchedule};

/// Placeholder remarks shown for rows with nothing entered.
pub const NO_REMARKS: &str = "No Remarks";

const SUBMISSION_TIME_FORMAT: &str = "%I:%M %p";

/// One value cell of a row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureValue {
    /// Test or sub-type identifier the value is filed under
    pub type_id: i64,
    /// Test or sub-type name
    pub name: String,
    pub value: String,
}

/// One animal's row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureRow {
    pub animal_id: String,
    /// One cell for a plain test, one per sub-type otherwise
    pub values: Vec<CaptureValue>,
    pub remarks: String,
    /// True when any value was already captured
    pub has_existing: bool,
}

impl CaptureRow {
    pub fn value_of(&self, type_id: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.type_id == type_id)
            .map(|v| v.value.as_str())
    }

    /// Every cell carries a non-blank value.
    pub fn is_filled(&self) -> bool {
        self.values.iter().all(|v| !v.value.trim().is_empty())
    }

    /// Set a cell's value. Returns false for an unknown type ID.
    pub fn set_value(&mut self, type_id: i64, value: impl Into<String>) -> bool {
        match self.values.iter_mut().find(|v| v.type_id == type_id) {
            Some(cell) => {
                cell.value = value.into();
                true
            }
            None => false,
        }
    }
}

/// Pre-filled entry grid for a scheduled occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureSheet {
    pub group_id: i64,
    pub test_id: i64,
    pub test_name: String,
    pub date: NaiveDate,
    pub uses_sub_types: bool,
    pub rows: Vec<CaptureRow>,
}

impl CaptureSheet {
    /// Build the sheet from the group roster and already captured records.
    ///
    /// Fails when `date` is not one of the test's scheduled dates.
    pub fn build(
        group: &Group,
        test: &TestType,
        schedule: &TestSchedule,
        date: NaiveDate,
        records: &[CapturedRecord],
    ) -> CaptureResult<Self> {
        if !schedule.is_scheduled(date) {
            return Err(CaptureError::NotScheduled {
                test_id: test.id,
                date,
            });
        }

        let uses_sub_types = test.requires_sub_types();
        let columns: Vec<(i64, &str)> = if uses_sub_types {
            test.sub_types.iter().map(|st| (st.id, st.name.as_str())).collect()
        } else {
            vec![(test.id, test.name.as_str())]
        };

        let on_date: Vec<&CapturedRecord> = records
            .iter()
            .filter(|r| r.group_id == group.id && r.date() == Some(date))
            .collect();

        let rows = group
            .animal_ids()
            .into_iter()
            .map(|animal_id| {
                let mine: Vec<&CapturedRecord> = on_date
                    .iter()
                    .copied()
                    .filter(|r| r.animal_id == animal_id)
                    .collect();

                let values: Vec<CaptureValue> = columns
                    .iter()
                    .map(|(type_id, name)| {
                        let existing = mine.iter().rev().find(|r| {
                            if uses_sub_types {
                                test.sub_types
                                    .iter()
                                    .find(|st| st.id == *type_id)
                                    .is_some_and(|st| r.matches_sub_type(st))
                            } else {
                                r.test_type_id == *type_id
                            }
                        });
                        CaptureValue {
                            type_id: *type_id,
                            name: name.to_string(),
                            value: existing
                                .and_then(|r| r.value.clone())
                                .unwrap_or_default(),
                        }
                    })
                    .collect();

                let remarks = mine
                    .iter()
                    .rev()
                    .filter_map(|r| r.remarks.as_deref())
                    .find(|r| !r.trim().is_empty())
                    .unwrap_or(NO_REMARKS)
                    .to_string();
                let has_existing = values.iter().any(|v| !v.value.trim().is_empty());

                CaptureRow {
                    animal_id,
                    values,
                    remarks,
                    has_existing,
                }
            })
            .collect();

        Ok(Self {
            group_id: group.id,
            test_id: test.id,
            test_name: test.name.clone(),
            date,
            uses_sub_types,
            rows,
        })
    }

    pub fn row(&self, animal_id: &str) -> Option<&CaptureRow> {
        self.rows.iter().find(|r| r.animal_id == animal_id)
    }

    /// Every animal has every value.
    pub fn is_complete(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(CaptureRow::is_filled)
    }

    /// Submissions for the cells an operator changed.
    ///
    /// Blank cells are never sent. A cell that already had a value is sent
    /// as an update, otherwise as an add. Rows for animals not on the sheet
    /// are ignored.
    pub fn pending_submissions(
        &self,
        edited: &[CaptureRow],
        at: NaiveDateTime,
        default_remarks: &str,
    ) -> Vec<MeasurementSubmission> {
        let test_time = at.format(SUBMISSION_TIME_FORMAT).to_string();
        let test_date = format_submission(self.date);
        let mut submissions = Vec::new();

        for row in edited {
            let Some(original) = self.row(&row.animal_id) else {
                tracing::warn!(animal = %row.animal_id, "edited row not on capture sheet");
                continue;
            };
            let remarks_changed =
                entered_remarks(&row.remarks) != entered_remarks(&original.remarks);
            let remarks = submission_remarks(&row.remarks, default_remarks);

            for cell in &row.values {
                let value = cell.value.trim();
                if value.is_empty() {
                    continue;
                }
                let before = original.value_of(cell.type_id).unwrap_or("").trim();
                if value == before && !remarks_changed {
                    continue;
                }

                submissions.push(MeasurementSubmission {
                    test_type_id: cell.type_id,
                    call_mode: if before.is_empty() {
                        CallMode::Add
                    } else {
                        CallMode::Update
                    },
                    group_id: self.group_id,
                    test_name: cell.name.clone(),
                    rat_no: row.animal_id.clone(),
                    test_time: test_time.clone(),
                    test_date: test_date.clone(),
                    test_value: value.to_string(),
                    remarks: remarks.clone(),
                });
            }
        }

        submissions
    }
}

/// Remarks as typed by the operator; the placeholder counts as blank.
fn entered_remarks(remarks: &str) -> &str {
    match remarks.trim() {
        NO_REMARKS => "",
        other => other,
    }
}

fn submission_remarks(remarks: &str, default_remarks: &str) -> String {
    match entered_remarks(remarks) {
        "" => default_remarks.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Animal, DateRange, Sex, SubType};
    use crate::schedule::ScheduleResolver;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn group() -> Group {
        let mut group = Group::new(1, "G1", "R");
        group.male_animals = vec![Animal::new("M1", Sex::Male), Animal::new("M2", Sex::Male)];
        group
    }

    fn schedule_for(test: &TestType) -> TestSchedule {
        let range = DateRange::new(ymd(2025, 6, 1), Some(ymd(2025, 6, 30)), 30);
        ScheduleResolver::new().resolve(test, Some(&range), ymd(2025, 6, 10))
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        ymd(2025, 6, 10).and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_build_prefills_existing_values() {
        let test = TestType::new(10, "Body Weight", "D", 0);
        let mut record = CapturedRecord::new(1, 10, "M1", "10-06-2025", "250");
        record.remarks = Some("calm".into());

        let sheet =
            CaptureSheet::build(&group(), &test, &schedule_for(&test), ymd(2025, 6, 10), &[record])
                .unwrap();

        assert_eq!(sheet.rows.len(), 2);
        let m1 = sheet.row("M1").unwrap();
        assert_eq!(m1.value_of(10), Some("250"));
        assert_eq!(m1.remarks, "calm");
        assert!(m1.has_existing);

        let m2 = sheet.row("M2").unwrap();
        assert_eq!(m2.value_of(10), Some(""));
        assert_eq!(m2.remarks, NO_REMARKS);
        assert!(!sheet.is_complete());
    }

    #[test]
    fn test_build_rejects_unscheduled_date() {
        let test = TestType::new(10, "Food Intake", "W", 0);
        let result =
            CaptureSheet::build(&group(), &test, &schedule_for(&test), ymd(2025, 6, 10), &[]);

        assert!(matches!(result, Err(CaptureError::NotScheduled { test_id: 10, .. })));
    }

    #[test]
    fn test_sub_type_columns() {
        let mut test = TestType::new(20, "Hematology", "D", 0);
        test.is_sub_type_applicable = true;
        test.sub_types = vec![SubType::new(21, "WBC"), SubType::new(22, "RBC")];

        let sheet =
            CaptureSheet::build(&group(), &test, &schedule_for(&test), ymd(2025, 6, 10), &[])
                .unwrap();
        assert!(sheet.uses_sub_types);
        let names: Vec<&str> = sheet.rows[0].values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["WBC", "RBC"]);
    }

    #[test]
    fn test_pending_submissions() {
        let test = TestType::new(10, "Body Weight", "D", 0);
        let records = vec![CapturedRecord::new(1, 10, "M1", "2025-06-10", "250")];
        let sheet =
            CaptureSheet::build(&group(), &test, &schedule_for(&test), ymd(2025, 6, 10), &records)
                .unwrap();

        let mut edited = sheet.rows.clone();
        edited[0].set_value(10, "255");
        edited[1].set_value(10, "301");

        let submissions =
            sheet.pending_submissions(&edited, at(14, 5), "Data captured via mobile app");
        assert_eq!(submissions.len(), 2);

        assert_eq!(submissions[0].rat_no, "M1");
        assert_eq!(submissions[0].call_mode, CallMode::Update);
        assert_eq!(submissions[0].test_value, "255");
        assert_eq!(submissions[0].test_date, "10-06-2025");
        assert_eq!(submissions[0].test_time, "02:05 PM");
        assert_eq!(submissions[0].remarks, "Data captured via mobile app");

        assert_eq!(submissions[1].rat_no, "M2");
        assert_eq!(submissions[1].call_mode, CallMode::Add);
    }

    #[test]
    fn test_unchanged_and_blank_cells_are_skipped() {
        let test = TestType::new(10, "Body Weight", "D", 0);
        let records = vec![CapturedRecord::new(1, 10, "M1", "2025-06-10", "250")];
        let sheet =
            CaptureSheet::build(&group(), &test, &schedule_for(&test), ymd(2025, 6, 10), &records)
                .unwrap();

        let mut edited = sheet.rows.clone();
        edited[1].set_value(10, "   ");
        assert!(sheet.pending_submissions(&edited, at(9, 0), "x").is_empty());

        edited[0].remarks = "lethargic".into();
        let submissions = sheet.pending_submissions(&edited, at(9, 0), "x");
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].remarks, "lethargic");
        assert_eq!(submissions[0].test_time, "09:00 AM");
    }

    #[test]
    fn test_cleared_placeholder_is_not_a_remark_change() {
        let test = TestType::new(10, "Body Weight", "D", 0);
        let records = vec![CapturedRecord::new(1, 10, "M1", "2025-06-10", "250")];
        let sheet =
            CaptureSheet::build(&group(), &test, &schedule_for(&test), ymd(2025, 6, 10), &records)
                .unwrap();
        assert_eq!(sheet.row("M1").unwrap().remarks, NO_REMARKS);

        let mut edited = sheet.rows.clone();
        edited[0].remarks = String::new();
        edited[1].remarks = "  ".into();
        assert!(sheet.pending_submissions(&edited, at(9, 0), "x").is_empty());

        edited[0].remarks = format!(" {NO_REMARKS} ");
        assert!(sheet.pending_submissions(&edited, at(9, 0), "x").is_empty());
    }
}
