use rusqlite::{Connection, Row, params};

use super::{collect, ensure_changed, query_one};
use crate::db::Result;
use crate::db::transactions::write;
use crate::pm::{NewProgram, Program, ProgramPatch};

const ENTITY: &str = "Program";

const SELECT: &str = "SELECT id, name, description, program_manager_user_id, start_date, end_date
     FROM programs";

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Program> {
    Ok(Program {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        program_manager_user_id: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<Program>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY id"))?;
    collect(stmt.query_map([], from_row)?)
}

pub fn get(conn: &Connection, id: i64) -> Result<Program> {
    query_one(conn, &format!("{SELECT} WHERE id = ?1"), id, ENTITY, from_row)
}

pub fn create(conn: &mut Connection, input: &NewProgram) -> Result<Program> {
    input.validate()?;
    write(conn, |tx| {
        tx.execute(
            "INSERT INTO programs (name, description, program_manager_user_id, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                input.name.trim(),
                input.description,
                input.program_manager_user_id,
                input.start_date,
                input.end_date,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tracing::info!(program_id = id, "program created");
        get(tx, id)
    })
}

pub fn update(conn: &mut Connection, id: i64, patch: &ProgramPatch) -> Result<Program> {
    patch.validate()?;
    write(conn, |tx| {
        let mut program = get(tx, id)?;
        if let Some(name) = &patch.name {
            program.name = name.trim().to_string();
        }
        if let Some(description) = &patch.description {
            program.description.clone_from(description);
        }
        if let Some(manager) = patch.program_manager_user_id {
            program.program_manager_user_id = manager;
        }
        if let Some(start) = patch.start_date {
            program.start_date = start;
        }
        if let Some(end) = patch.end_date {
            program.end_date = end;
        }

        tx.execute(
            "UPDATE programs
             SET name = ?2, description = ?3, program_manager_user_id = ?4,
                 start_date = ?5, end_date = ?6
             WHERE id = ?1",
            params![
                id,
                program.name,
                program.description,
                program.program_manager_user_id,
                program.start_date,
                program.end_date,
            ],
        )?;
        Ok(program)
    })
}

/// Fails with a constraint violation while milestones, parts or work items
/// still reference the program.
pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
    write(conn, |tx| {
        let changed = tx.execute("DELETE FROM programs WHERE id = ?1", [id])?;
        ensure_changed(changed, ENTITY, id)?;
        tracing::info!(program_id = id, "program deleted");
        Ok(())
    })
}
