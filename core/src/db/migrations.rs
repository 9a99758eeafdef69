//! Schema versioning and migrations
//!
//! Forward-only. The applied version lives in `PRAGMA user_version`, so a
//! fresh database reports 0 and every migration step runs exactly once.

use rusqlite::{Connection, TransactionBehavior};

use super::transactions::execute_in_transaction;
use super::{DbError, Result};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

const V1_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS discipline_teams (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    name                 TEXT NOT NULL,
    description          TEXT,
    team_manager_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS users (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    username            TEXT NOT NULL UNIQUE,
    name                TEXT NOT NULL,
    email               TEXT NOT NULL,
    phone_number        TEXT,
    role                TEXT NOT NULL,
    profile_picture_url TEXT,
    discipline_team_id  INTEGER REFERENCES discipline_teams(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS programs (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    name                    TEXT NOT NULL,
    description             TEXT,
    program_manager_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    start_date              TEXT NOT NULL,
    end_date                TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS milestones (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT,
    date        TEXT NOT NULL,
    program_id  INTEGER NOT NULL REFERENCES programs(id)
);

CREATE TABLE IF NOT EXISTS part_numbers (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    number           INTEGER NOT NULL,
    part_name        TEXT NOT NULL,
    level            INTEGER NOT NULL DEFAULT 0,
    state            TEXT NOT NULL,
    revision_level   TEXT NOT NULL,
    assigned_user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    program_id       INTEGER NOT NULL REFERENCES programs(id),
    parent_id        INTEGER REFERENCES part_numbers(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS work_items (
    id                        INTEGER PRIMARY KEY AUTOINCREMENT,
    work_item_type            TEXT NOT NULL,
    title                     TEXT NOT NULL,
    description               TEXT,
    status                    TEXT NOT NULL,
    priority                  TEXT NOT NULL,
    tags                      TEXT,
    date_opened               TEXT NOT NULL,
    due_date                  TEXT NOT NULL,
    estimated_completion_date TEXT,
    actual_completion_date    TEXT,
    percent_complete          INTEGER NOT NULL DEFAULT 0
                              CHECK (percent_complete BETWEEN 0 AND 100),
    input_status              TEXT,
    program_id                INTEGER NOT NULL REFERENCES programs(id),
    due_by_milestone_id       INTEGER REFERENCES milestones(id) ON DELETE SET NULL,
    author_user_id            INTEGER NOT NULL REFERENCES users(id),
    assigned_user_id          INTEGER REFERENCES users(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS issue_details (
    work_item_id      INTEGER PRIMARY KEY REFERENCES work_items(id) ON DELETE CASCADE,
    issue_type        TEXT NOT NULL,
    root_cause        TEXT,
    corrective_action TEXT
);

CREATE TABLE IF NOT EXISTS deliverable_details (
    work_item_id     INTEGER PRIMARY KEY REFERENCES work_items(id) ON DELETE CASCADE,
    deliverable_type TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS work_item_part_numbers (
    work_item_id   INTEGER NOT NULL REFERENCES work_items(id) ON DELETE CASCADE,
    part_number_id INTEGER NOT NULL REFERENCES part_numbers(id) ON DELETE CASCADE,
    PRIMARY KEY (work_item_id, part_number_id)
);

CREATE INDEX IF NOT EXISTS idx_users_team ON users(discipline_team_id);
CREATE INDEX IF NOT EXISTS idx_teams_manager ON discipline_teams(team_manager_user_id);
CREATE INDEX IF NOT EXISTS idx_programs_manager ON programs(program_manager_user_id);
CREATE INDEX IF NOT EXISTS idx_milestones_program ON milestones(program_id);
CREATE INDEX IF NOT EXISTS idx_parts_program ON part_numbers(program_id);
CREATE INDEX IF NOT EXISTS idx_parts_parent ON part_numbers(parent_id);
CREATE INDEX IF NOT EXISTS idx_parts_assignee ON part_numbers(assigned_user_id);
CREATE INDEX IF NOT EXISTS idx_work_items_program ON work_items(program_id);
CREATE INDEX IF NOT EXISTS idx_work_items_milestone ON work_items(due_by_milestone_id);
CREATE INDEX IF NOT EXISTS idx_work_items_author ON work_items(author_user_id);
CREATE INDEX IF NOT EXISTS idx_work_items_assignee ON work_items(assigned_user_id);
CREATE INDEX IF NOT EXISTS idx_links_part ON work_item_part_numbers(part_number_id);
"#;

/// Apply all migrations to bring DB to current version
pub fn migrate_to_latest(conn: &mut Connection) -> Result<()> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "database is at schema version {current}, newer than supported {SCHEMA_VERSION}"
        )));
    }

    if current < 1 {
        execute_in_transaction(conn, TransactionBehavior::Immediate, |tx| {
            tx.execute_batch(V1_SCHEMA)
                .map_err(|e| DbError::Migration(format!("v1: {e}")))?;
            set_schema_version(tx, 1)
        })?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}

/// Get current schema version
pub fn schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn migrates_fresh_database_once() {
        let mut conn = open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).ok(), Some(0));

        migrate_to_latest(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).ok(), Some(SCHEMA_VERSION));

        // Second run is a no-op.
        migrate_to_latest(&mut conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'work_items'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn refuses_newer_schema() {
        let mut conn = open_in_memory().unwrap();
        set_schema_version(&conn, SCHEMA_VERSION + 1).unwrap();
        assert!(matches!(
            migrate_to_latest(&mut conn),
            Err(DbError::Migration(_))
        ));
    }
}
