//! Part numbers. Writes keep the parent relation a tree inside one program:
//! a parent must exist, belong to the same program, and not be the part
//! itself or one of its descendants, and the tree stays at most
//! [`MAX_PART_DEPTH`] levels deep.

use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{collect, ensure_changed, query_one};
use crate::db::transactions::write;
use crate::db::{DbError, Result};
use crate::pm::{NewPartNumber, PartNumber, PartNumberPatch};

const ENTITY: &str = "PartNumber";

/// Most levels a part tree may have, roots included.
pub const MAX_PART_DEPTH: usize = 64;

const SELECT: &str = "SELECT id, number, part_name, level, state, revision_level, assigned_user_id,
            program_id, parent_id
     FROM part_numbers";

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<PartNumber> {
    Ok(PartNumber {
        id: row.get(0)?,
        number: row.get(1)?,
        part_name: row.get(2)?,
        level: row.get(3)?,
        state: row.get(4)?,
        revision_level: row.get(5)?,
        assigned_user_id: row.get(6)?,
        program_id: row.get(7)?,
        parent_id: row.get(8)?,
    })
}

pub fn list(conn: &Connection, program_id: Option<i64>) -> Result<Vec<PartNumber>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT} WHERE ?1 IS NULL OR program_id = ?1 ORDER BY number, id"
    ))?;
    collect(stmt.query_map([program_id], from_row)?)
}

pub fn list_by_user(conn: &Connection, user_id: i64) -> Result<Vec<PartNumber>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT} WHERE assigned_user_id = ?1 ORDER BY number, id"
    ))?;
    collect(stmt.query_map([user_id], from_row)?)
}

pub fn get(conn: &Connection, id: i64) -> Result<PartNumber> {
    query_one(conn, &format!("{SELECT} WHERE id = ?1"), id, ENTITY, from_row)
}

fn check_parent(
    conn: &Connection,
    part_id: Option<i64>,
    program_id: i64,
    parent_id: i64,
) -> Result<()> {
    if part_id == Some(parent_id) {
        return Err(DbError::Invalid(format!(
            "part number {parent_id} cannot be its own parent"
        )));
    }
    let parent = match get(conn, parent_id) {
        Ok(parent) => parent,
        Err(DbError::NotFound { .. }) => {
            return Err(DbError::Invalid(format!(
                "parent part number {parent_id} does not exist"
            )));
        }
        Err(e) => return Err(e),
    };
    if parent.program_id != program_id {
        return Err(DbError::Invalid(format!(
            "parent part number {parent_id} belongs to program {}, not {program_id}",
            parent.program_id
        )));
    }

    // Depth of the parent: 0 for a root.
    let mut parent_depth = 0usize;
    let mut seen = HashSet::from([parent_id]);
    let mut cursor = parent.parent_id;
    while let Some(ancestor) = cursor {
        if part_id == Some(ancestor) {
            return Err(DbError::Invalid(format!(
                "parent part number {parent_id} is a descendant of {ancestor}"
            )));
        }
        if !seen.insert(ancestor) {
            break;
        }
        parent_depth += 1;
        cursor = conn
            .query_row(
                "SELECT parent_id FROM part_numbers WHERE id = ?1",
                [ancestor],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();
    }

    let subtree_height = match part_id {
        Some(id) => subtree_height(conn, id)?,
        None => 0,
    };
    let deepest = parent_depth + 1 + subtree_height;
    if deepest >= MAX_PART_DEPTH {
        return Err(DbError::Invalid(format!(
            "placing part under {parent_id} would nest {} levels deep; at most {MAX_PART_DEPTH} allowed",
            deepest + 1
        )));
    }
    Ok(())
}

/// Levels below `id`: 0 for a leaf. The walk stops at [`MAX_PART_DEPTH`].
fn subtree_height(conn: &Connection, id: i64) -> Result<usize> {
    let height: i64 = conn.query_row(
        "WITH RECURSIVE below(id, depth) AS (
             SELECT id, 0 FROM part_numbers WHERE id = ?1
             UNION ALL
             SELECT p.id, below.depth + 1
             FROM part_numbers p JOIN below ON p.parent_id = below.id
             WHERE below.depth < ?2
         )
         SELECT COALESCE(MAX(depth), 0) FROM below",
        params![id, MAX_PART_DEPTH as i64],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(height).unwrap_or(MAX_PART_DEPTH))
}

pub fn create(conn: &mut Connection, input: &NewPartNumber) -> Result<PartNumber> {
    input.validate()?;
    write(conn, |tx| {
        if let Some(parent_id) = input.parent_id {
            check_parent(tx, None, input.program_id, parent_id)?;
        }
        tx.execute(
            "INSERT INTO part_numbers (number, part_name, level, state, revision_level,
                                       assigned_user_id, program_id, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                input.number,
                input.part_name.trim(),
                input.level,
                input.state,
                input.revision_level.trim(),
                input.assigned_user_id,
                input.program_id,
                input.parent_id,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tracing::info!(part_number_id = id, program_id = input.program_id, "part number created");
        get(tx, id)
    })
}

pub fn update(conn: &mut Connection, id: i64, patch: &PartNumberPatch) -> Result<PartNumber> {
    patch.validate()?;
    write(conn, |tx| {
        let mut part = get(tx, id)?;
        if let Some(number) = patch.number {
            part.number = number;
        }
        if let Some(name) = &patch.part_name {
            part.part_name = name.trim().to_string();
        }
        if let Some(level) = patch.level {
            part.level = level;
        }
        if let Some(state) = patch.state {
            part.state = state;
        }
        if let Some(revision) = &patch.revision_level {
            part.revision_level = revision.trim().to_string();
        }
        if let Some(assignee) = patch.assigned_user_id {
            part.assigned_user_id = assignee;
        }
        if let Some(parent_id) = patch.parent_id {
            if let Some(parent_id) = parent_id {
                check_parent(tx, Some(id), part.program_id, parent_id)?;
            }
            part.parent_id = parent_id;
        }

        tx.execute(
            "UPDATE part_numbers
             SET number = ?2, part_name = ?3, level = ?4, state = ?5, revision_level = ?6,
                 assigned_user_id = ?7, parent_id = ?8
             WHERE id = ?1",
            params![
                id,
                part.number,
                part.part_name,
                part.level,
                part.state,
                part.revision_level,
                part.assigned_user_id,
                part.parent_id,
            ],
        )?;
        Ok(part)
    })
}

/// Children become roots; work item links to the part are dropped.
pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
    write(conn, |tx| {
        let changed = tx.execute("DELETE FROM part_numbers WHERE id = ?1", [id])?;
        ensure_changed(changed, ENTITY, id)?;
        tracing::info!(part_number_id = id, "part number deleted");
        Ok(())
    })
}
