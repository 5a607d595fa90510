//! SQLite schema definition.

/// Complete local store schema.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Activities (API order, duplicates kept; dedupe happens at load)
-- ============================================================================

CREATE TABLE IF NOT EXISTS activities (
    position INTEGER PRIMARY KEY AUTOINCREMENT,
    ref_num TEXT NOT NULL,
    status TEXT,
    title TEXT
);

CREATE INDEX IF NOT EXISTS idx_activities_ref ON activities(ref_num);

-- ============================================================================
-- Project Dates (raw collaborator strings, normalized on read)
-- ============================================================================

CREATE TABLE IF NOT EXISTS project_dates (
    project_code TEXT PRIMARY KEY,
    start_date TEXT,
    end_date TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Study Groups
-- ============================================================================

CREATE TABLE IF NOT EXISTS study_groups (
    project_ref TEXT NOT NULL,
    group_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    study_type TEXT NOT NULL DEFAULT '',
    species_type TEXT NOT NULL DEFAULT '',
    project_title TEXT,
    no_of_male INTEGER NOT NULL DEFAULT 0,
    no_of_female INTEGER NOT NULL DEFAULT 0,
    male_animals TEXT NOT NULL DEFAULT '[]',     -- JSON array of Animal
    female_animals TEXT NOT NULL DEFAULT '[]',   -- JSON array of Animal
    PRIMARY KEY (project_ref, group_id)
);

-- ============================================================================
-- Test Types
-- ============================================================================

CREATE TABLE IF NOT EXISTS test_types (
    project_ref TEXT NOT NULL,
    test_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    test_frequency TEXT NOT NULL DEFAULT '',
    no_of_days INTEGER NOT NULL DEFAULT 0,
    date_schedule TEXT,
    is_sub_type_applicable INTEGER NOT NULL DEFAULT 0,
    sub_types TEXT NOT NULL DEFAULT '[]',        -- JSON array of SubType
    PRIMARY KEY (project_ref, test_id)
);

-- ============================================================================
-- Captured Records (one value per animal, test/sub-type and date)
-- ============================================================================

CREATE TABLE IF NOT EXISTS captured_records (
    record_id TEXT PRIMARY KEY,
    project_ref TEXT NOT NULL,
    group_id INTEGER NOT NULL,
    test_type_id INTEGER NOT NULL,
    test_sub_type TEXT,
    rat_no TEXT NOT NULL,
    test_date TEXT NOT NULL,                     -- ISO YYYY-MM-DD
    test_time TEXT,
    t_value TEXT,
    remarks TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (project_ref, group_id, test_type_id, rat_no, test_date)
);

CREATE INDEX IF NOT EXISTS idx_records_project ON captured_records(project_ref);
CREATE INDEX IF NOT EXISTS idx_records_date ON captured_records(project_ref, test_date);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_record_uniqueness() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let insert = "INSERT INTO captured_records (record_id, project_ref, group_id, test_type_id, rat_no, test_date, t_value)
                      VALUES (?1, 'P1', 1, 10, 'R1', '2025-06-01', '250')";
        conn.execute(insert, ["a"]).unwrap();

        // Same animal, test and date under a new ID
        assert!(conn.execute(insert, ["b"]).is_err());
    }
}
