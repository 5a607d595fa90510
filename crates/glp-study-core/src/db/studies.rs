//! Activity, project date, group and test operations.

use rusqlite::params;

use super::{Database, DbError, DbResult};
use crate::models::{Activity, Group, ProjectDates, TestType};

impl Database {
    /// Replace the stored activity list, keeping the given order.
    pub fn replace_activities(&self, activities: &[Activity]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM activities", [])?;
        for activity in activities {
            tx.execute(
                "INSERT INTO activities (ref_num, status, title) VALUES (?1, ?2, ?3)",
                params![activity.ref_num, activity.status, activity.title],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Activities in stored order, duplicates included.
    pub fn list_activities(&self) -> DbResult<Vec<Activity>> {
        let mut stmt = self
            .conn
            .prepare("SELECT ref_num, status, title FROM activities ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            Ok(Activity {
                ref_num: row.get(0)?,
                status: row.get(1)?,
                title: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert or update project start/end dates.
    pub fn upsert_project_dates(&self, dates: &[ProjectDates]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for d in dates {
            tx.execute(
                r#"
                INSERT INTO project_dates (project_code, start_date, end_date, updated_at)
                VALUES (?1, ?2, ?3, datetime('now'))
                ON CONFLICT(project_code) DO UPDATE SET
                    start_date = excluded.start_date,
                    end_date = excluded.end_date,
                    updated_at = datetime('now')
                "#,
                params![d.project_code, d.start_date, d.end_date],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_project_dates(&self) -> DbResult<Vec<ProjectDates>> {
        let mut stmt = self.conn.prepare(
            "SELECT project_code, start_date, end_date FROM project_dates ORDER BY project_code",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProjectDates {
                project_code: row.get(0)?,
                start_date: row.get(1)?,
                end_date: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Replace the groups of one project.
    pub fn replace_groups(&self, project_ref: &str, groups: &[Group]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM study_groups WHERE project_ref = ?", [project_ref])?;
        for (position, group) in groups.iter().enumerate() {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO study_groups (
                    project_ref, group_id, position, name, study_type, species_type,
                    project_title, no_of_male, no_of_female, male_animals, female_animals
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    project_ref,
                    group.id,
                    position as i64,
                    group.name,
                    group.study_type,
                    group.species_type,
                    group.project_title,
                    group.no_of_male,
                    group.no_of_female,
                    serde_json::to_string(&group.male_animals)?,
                    serde_json::to_string(&group.female_animals)?,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Groups of one project in stored order.
    pub fn list_groups(&self, project_ref: &str) -> DbResult<Vec<Group>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT group_id, name, study_type, species_type, project_title,
                   no_of_male, no_of_female, male_animals, female_animals
            FROM study_groups
            WHERE project_ref = ?
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map([project_ref], |row| {
            Ok(GroupRow {
                id: row.get(0)?,
                name: row.get(1)?,
                study_type: row.get(2)?,
                species_type: row.get(3)?,
                project_title: row.get(4)?,
                no_of_male: row.get(5)?,
                no_of_female: row.get(6)?,
                male_animals: row.get(7)?,
                female_animals: row.get(8)?,
            })
        })?;

        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?.try_into()?);
        }
        Ok(groups)
    }

    /// Replace the tests of one project.
    pub fn replace_tests(&self, project_ref: &str, tests: &[TestType]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM test_types WHERE project_ref = ?", [project_ref])?;
        for (position, test) in tests.iter().enumerate() {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO test_types (
                    project_ref, test_id, position, name, test_frequency, no_of_days,
                    date_schedule, is_sub_type_applicable, sub_types
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    project_ref,
                    test.id,
                    position as i64,
                    test.name,
                    test.test_frequency,
                    test.no_of_days,
                    test.date_schedule,
                    test.is_sub_type_applicable,
                    serde_json::to_string(&test.sub_types)?,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Tests of one project in stored order.
    pub fn list_tests(&self, project_ref: &str) -> DbResult<Vec<TestType>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT test_id, name, test_frequency, no_of_days, date_schedule,
                   is_sub_type_applicable, sub_types
            FROM test_types
            WHERE project_ref = ?
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map([project_ref], |row| {
            Ok(TestTypeRow {
                id: row.get(0)?,
                name: row.get(1)?,
                test_frequency: row.get(2)?,
                no_of_days: row.get(3)?,
                date_schedule: row.get(4)?,
                is_sub_type_applicable: row.get(5)?,
                sub_types: row.get(6)?,
            })
        })?;

        let mut tests = Vec::new();
        for row in rows {
            let mut test: TestType = row?.try_into()?;
            test.project_code = Some(project_ref.to_string());
            tests.push(test);
        }
        Ok(tests)
    }
}

struct GroupRow {
    id: i64,
    name: String,
    study_type: String,
    species_type: String,
    project_title: Option<String>,
    no_of_male: u32,
    no_of_female: u32,
    male_animals: String,
    female_animals: String,
}

impl TryFrom<GroupRow> for Group {
    type Error = DbError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        Ok(Group {
            id: row.id,
            name: row.name,
            study_type: row.study_type,
            species_type: row.species_type,
            project_title: row.project_title,
            no_of_male: row.no_of_male,
            no_of_female: row.no_of_female,
            male_animals: serde_json::from_str(&row.male_animals)?,
            female_animals: serde_json::from_str(&row.female_animals)?,
        })
    }
}

struct TestTypeRow {
    id: i64,
    name: String,
    test_frequency: String,
    no_of_days: i64,
    date_schedule: Option<String>,
    is_sub_type_applicable: bool,
    sub_types: String,
}

impl TryFrom<TestTypeRow> for TestType {
    type Error = DbError;

    fn try_from(row: TestTypeRow) -> Result<Self, Self::Error> {
        Ok(TestType {
            id: row.id,
            name: row.name,
            project_code: None,
            test_frequency: row.test_frequency,
            no_of_days: row.no_of_days,
            date_schedule: row.date_schedule,
            is_sub_type_applicable: row.is_sub_type_applicable,
            sub_types: serde_json::from_str(&row.sub_types)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Animal, Sex, SubType};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_activities_keep_order_and_duplicates() {
        let db = setup_db();
        db.replace_activities(&[
            Activity::new("P2", "completed"),
            Activity::new("P1", "in progress"),
            Activity::new("P2", "in progress"),
        ])
        .unwrap();

        let refs: Vec<String> =
            db.list_activities().unwrap().into_iter().map(|a| a.ref_num).collect();
        assert_eq!(refs, vec!["P2", "P1", "P2"]);

        db.replace_activities(&[Activity::new("P3", "completed")]).unwrap();
        assert_eq!(db.list_activities().unwrap().len(), 1);
    }

    #[test]
    fn test_project_dates_upsert() {
        let db = setup_db();
        db.upsert_project_dates(&[ProjectDates::new("P1", "22-May-2025", None)])
            .unwrap();
        db.upsert_project_dates(&[ProjectDates::new("P1", "22-May-2025", Some("21-Jun-2025"))])
            .unwrap();

        let dates = db.list_project_dates().unwrap();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].end_date.as_deref(), Some("21-Jun-2025"));
    }

    #[test]
    fn test_groups_round_trip() {
        let db = setup_db();
        let mut g1 = Group::new(7, "High Dose", "R");
        g1.project_title = Some("28-Day Oral Toxicity".into());
        g1.male_animals = vec![Animal::new("R1", Sex::Male)];
        g1.female_animals = vec![Animal::new("R2", Sex::Female)];
        let g2 = Group::new(3, "Control", "R");

        db.replace_groups("P1", &[g1.clone(), g2.clone()]).unwrap();

        let groups = db.list_groups("P1").unwrap();
        assert_eq!(groups, vec![g1, g2]);
        assert!(db.list_groups("P2").unwrap().is_empty());
    }

    #[test]
    fn test_tests_round_trip() {
        let db = setup_db();
        let mut hematology = TestType::new(20, "Hematology", "W", 0);
        hematology.is_sub_type_applicable = true;
        hematology.sub_types = vec![SubType::new(21, "WBC")];

        db.replace_tests("P1", &[hematology]).unwrap();
        db.replace_tests("P1", &[TestType::new(10, "Body Weight", "D", 2)]).unwrap();

        let tests = db.list_tests("P1").unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].id, 10);
        assert_eq!(tests[0].no_of_days, 2);
        assert_eq!(tests[0].project_code.as_deref(), Some("P1"));
        assert!(db.list_tests("P9").unwrap().is_empty());
    }
}
