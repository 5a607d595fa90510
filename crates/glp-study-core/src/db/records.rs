//! Captured record operations.

use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::{Database, DbError, DbResult};
use crate::models::{CallMode, CapturedRecord, MeasurementSubmission};
use crate::schedule::{format_iso, normalize_date};

impl Database {
    /// Insert or replace a captured record. Dates are stored as ISO.
    ///
    /// Returns the record ID; an existing record for the same animal, test
    /// and date keeps its ID.
    pub fn upsert_captured_record(
        &self,
        project_ref: &str,
        record: &CapturedRecord,
    ) -> DbResult<String> {
        let date = iso_date(&record.test_date)?;
        self.upsert_value(
            project_ref,
            record.record_id.as_deref(),
            record.group_id,
            record.test_type_id,
            record.test_sub_type.as_deref(),
            &record.animal_id,
            &date,
            None,
            record.value.as_deref(),
            record.remarks.as_deref(),
        )
    }

    /// Replace every captured record of a project.
    pub fn replace_captured_records(
        &self,
        project_ref: &str,
        records: &[CapturedRecord],
    ) -> DbResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM captured_records WHERE project_ref = ?", [project_ref])?;

        let mut stored = 0;
        for record in records {
            match self.upsert_captured_record(project_ref, record) {
                Ok(_) => stored += 1,
                Err(DbError::InvalidDate(raw)) => {
                    tracing::warn!(
                        project = project_ref,
                        date = %raw,
                        "skipping record with unrecognized date"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        tx.commit()?;
        Ok(stored)
    }

    /// Store a measurement submission. Returns the record ID and whether an
    /// existing value was replaced.
    pub fn record_submission(
        &self,
        project_ref: &str,
        submission: &MeasurementSubmission,
    ) -> DbResult<(String, bool)> {
        let date = iso_date(&submission.test_date)?;

        let existed = self.find_record_id(
            project_ref,
            submission.group_id,
            submission.test_type_id,
            &submission.rat_no,
            &date,
        )?;
        if submission.call_mode == CallMode::Update && existed.is_none() {
            tracing::debug!(rat = %submission.rat_no, "update for missing record, storing as new");
        }

        let record_id = self.upsert_value(
            project_ref,
            None,
            submission.group_id,
            submission.test_type_id,
            None,
            &submission.rat_no,
            &date,
            Some(&submission.test_time),
            Some(&submission.test_value),
            Some(&submission.remarks),
        )?;
        Ok((record_id, existed.is_some()))
    }

    /// Every captured record of a project, oldest date first.
    pub fn list_captured_records(&self, project_ref: &str) -> DbResult<Vec<CapturedRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT record_id, group_id, test_type_id, test_sub_type, rat_no,
                   test_date, t_value, remarks
            FROM captured_records
            WHERE project_ref = ?
            ORDER BY test_date, group_id, rat_no, test_type_id
            "#,
        )?;
        let rows = stmt.query_map([project_ref], |row| {
            Ok(CapturedRecord {
                record_id: row.get(0)?,
                group_id: row.get(1)?,
                test_type_id: row.get(2)?,
                test_sub_type: row.get(3)?,
                animal_id: row.get(4)?,
                test_date: row.get(5)?,
                value: row.get(6)?,
                remarks: row.get(7)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get a captured record by ID.
    pub fn get_captured_record(&self, record_id: &str) -> DbResult<CapturedRecord> {
        self.conn
            .query_row(
                r#"
                SELECT record_id, group_id, test_type_id, test_sub_type, rat_no,
                       test_date, t_value, remarks
                FROM captured_records
                WHERE record_id = ?
                "#,
                [record_id],
                |row| {
                    Ok(CapturedRecord {
                        record_id: row.get(0)?,
                        group_id: row.get(1)?,
                        test_type_id: row.get(2)?,
                        test_sub_type: row.get(3)?,
                        animal_id: row.get(4)?,
                        test_date: row.get(5)?,
                        value: row.get(6)?,
                        remarks: row.get(7)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| DbError::NotFound(record_id.to_string()))
    }

    fn find_record_id(
        &self,
        project_ref: &str,
        group_id: i64,
        test_type_id: i64,
        rat_no: &str,
        iso_date: &str,
    ) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                r#"
                SELECT record_id FROM captured_records
                WHERE project_ref = ?1 AND group_id = ?2 AND test_type_id = ?3
                  AND rat_no = ?4 AND test_date = ?5
                "#,
                params![project_ref, group_id, test_type_id, rat_no, iso_date],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    #[allow(clippy::too_many_arguments)]
    fn upsert_value(
        &self,
        project_ref: &str,
        record_id: Option<&str>,
        group_id: i64,
        test_type_id: i64,
        test_sub_type: Option<&str>,
        rat_no: &str,
        iso_date: &str,
        test_time: Option<&str>,
        value: Option<&str>,
        remarks: Option<&str>,
    ) -> DbResult<String> {
        let existing = self.find_record_id(project_ref, group_id, test_type_id, rat_no, iso_date)?;
        let record_id = match existing {
            Some(existing) => existing,
            None => record_id
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        };

        self.conn.execute(
            r#"
            INSERT INTO captured_records (
                record_id, project_ref, group_id, test_type_id, test_sub_type,
                rat_no, test_date, test_time, t_value, remarks, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))
            ON CONFLICT(project_ref, group_id, test_type_id, rat_no, test_date) DO UPDATE SET
                test_sub_type = COALESCE(excluded.test_sub_type, captured_records.test_sub_type),
                test_time = COALESCE(excluded.test_time, captured_records.test_time),
                t_value = excluded.t_value,
                remarks = excluded.remarks,
                updated_at = datetime('now')
            "#,
            params![
                record_id,
                project_ref,
                group_id,
                test_type_id,
                test_sub_type,
                rat_no,
                iso_date,
                test_time,
                value,
                remarks,
            ],
        )?;
        Ok(record_id)
    }
}

/// Normalize a date string to the stored ISO form.
fn iso_date(raw: &str) -> DbResult<String> {
    normalize_date(raw)
        .map(format_iso)
        .ok_or_else(|| DbError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn submission(value: &str, mode: CallMode) -> MeasurementSubmission {
        MeasurementSubmission {
            test_type_id: 10,
            call_mode: mode,
            group_id: 1,
            test_name: "Body Weight".into(),
            rat_no: "R1".into(),
            test_time: "09:30 AM".into(),
            test_date: "02-06-2025".into(),
            test_value: value.into(),
            remarks: "Data captured via mobile app".into(),
        }
    }

    #[test]
    fn test_upsert_normalizes_date() {
        let db = setup_db();
        let record = CapturedRecord::new(1, 10, "R1", "02-Jun-2025", "250");
        let id = db.upsert_captured_record("P1", &record).unwrap();

        let stored = db.get_captured_record(&id).unwrap();
        assert_eq!(stored.test_date, "2025-06-02");
        assert_eq!(stored.value.as_deref(), Some("250"));
    }

    #[test]
    fn test_upsert_same_slot_keeps_id() {
        let db = setup_db();
        let first = db
            .upsert_captured_record("P1", &CapturedRecord::new(1, 10, "R1", "2025-06-02", "250"))
            .unwrap();
        let second = db
            .upsert_captured_record("P1", &CapturedRecord::new(1, 10, "R1", "02-06-2025", "252"))
            .unwrap();

        assert_eq!(first, second);
        let records = db.list_captured_records("P1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value.as_deref(), Some("252"));
    }

    #[test]
    fn test_invalid_date_rejected() {
        let db = setup_db();
        let record = CapturedRecord::new(1, 10, "R1", "sometime", "250");
        assert!(matches!(
            db.upsert_captured_record("P1", &record),
            Err(DbError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_replace_skips_bad_dates() {
        let db = setup_db();
        db.upsert_captured_record("P1", &CapturedRecord::new(1, 10, "R9", "2025-06-01", "1"))
            .unwrap();

        let stored = db
            .replace_captured_records(
                "P1",
                &[
                    CapturedRecord::new(1, 10, "R1", "2025-06-02", "250"),
                    CapturedRecord::new(1, 10, "R2", "not a date", "251"),
                ],
            )
            .unwrap();

        assert_eq!(stored, 1);
        let records = db.list_captured_records("P1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].animal_id, "R1");
    }

    #[test]
    fn test_record_submission_add_then_update() {
        let db = setup_db();

        let (id, replaced) = db.record_submission("P1", &submission("250", CallMode::Add)).unwrap();
        assert!(!replaced);

        let (same_id, replaced) = db
            .record_submission("P1", &submission("255", CallMode::Update))
            .unwrap();
        assert!(replaced);
        assert_eq!(id, same_id);

        let stored = db.get_captured_record(&id).unwrap();
        assert_eq!(stored.test_date, "2025-06-02");
        assert_eq!(stored.value.as_deref(), Some("255"));
    }

    #[test]
    fn test_get_missing_record() {
        let db = setup_db();
        assert!(matches!(
            db.get_captured_record("nope"),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_iso_date_helper() {
        assert_eq!(iso_date("21-Jun-2025").unwrap(), "2025-06-21");
        assert!(iso_date("").is_err());
    }
}
