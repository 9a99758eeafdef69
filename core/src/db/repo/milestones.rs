use rusqlite::{Connection, Row, params};

use super::{collect, ensure_changed, query_one};
use crate::db::Result;
use crate::db::transactions::write;
use crate::pm::{Milestone, MilestonePatch, NewMilestone};

const ENTITY: &str = "Milestone";

const SELECT: &str = "SELECT id, name, description, date, program_id FROM milestones";

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        date: row.get(3)?,
        program_id: row.get(4)?,
    })
}

/// Milestones ordered by date, optionally for one program.
pub fn list(conn: &Connection, program_id: Option<i64>) -> Result<Vec<Milestone>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT} WHERE ?1 IS NULL OR program_id = ?1 ORDER BY date, id"
    ))?;
    collect(stmt.query_map([program_id], from_row)?)
}

pub fn get(conn: &Connection, id: i64) -> Result<Milestone> {
    query_one(conn, &format!("{SELECT} WHERE id = ?1"), id, ENTITY, from_row)
}

pub fn create(conn: &mut Connection, input: &NewMilestone) -> Result<Milestone> {
    input.validate()?;
    write(conn, |tx| {
        tx.execute(
            "INSERT INTO milestones (name, description, date, program_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                input.name.trim(),
                input.description,
                input.date,
                input.program_id
            ],
        )?;
        get(tx, tx.last_insert_rowid())
    })
}

pub fn update(conn: &mut Connection, id: i64, patch: &MilestonePatch) -> Result<Milestone> {
    patch.validate()?;
    write(conn, |tx| {
        let mut milestone = get(tx, id)?;
        if let Some(name) = &patch.name {
            milestone.name = name.trim().to_string();
        }
        if let Some(description) = &patch.description {
            milestone.description.clone_from(description);
        }
        if let Some(date) = patch.date {
            milestone.date = date;
        }
        if let Some(program_id) = patch.program_id {
            milestone.program_id = program_id;
        }

        tx.execute(
            "UPDATE milestones SET name = ?2, description = ?3, date = ?4, program_id = ?5
             WHERE id = ?1",
            params![
                id,
                milestone.name,
                milestone.description,
                milestone.date,
                milestone.program_id
            ],
        )?;
        Ok(milestone)
    })
}

/// Work items due by the milestone keep existing with no milestone.
pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
    write(conn, |tx| {
        let changed = tx.execute("DELETE FROM milestones WHERE id = ?1", [id])?;
        ensure_changed(changed, ENTITY, id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::fixtures;

    fn milestone(program_id: i64, name: &str, day: u32) -> NewMilestone {
        NewMilestone {
            name: name.to_string(),
            description: None,
            date: fixtures::day(day),
            program_id,
        }
    }

    #[test]
    fn list_orders_by_date_and_filters_by_program() {
        let mut conn = fixtures::db();
        let a = fixtures::program(&mut conn, "A");
        let b = fixtures::program(&mut conn, "B");
        create(&mut conn, &milestone(a, "CDR", 20)).unwrap();
        create(&mut conn, &milestone(a, "PDR", 5)).unwrap();
        create(&mut conn, &milestone(b, "SRR", 1)).unwrap();

        let names = |ms: Vec<Milestone>| ms.into_iter().map(|m| m.name).collect::<Vec<_>>();
        assert_eq!(
            list(&conn, Some(a)).map(names).ok(),
            Some(vec!["PDR".to_string(), "CDR".to_string()])
        );
        assert_eq!(list(&conn, None).map(|m| m.len()).ok(), Some(3));
    }

    #[test]
    fn unknown_program_is_a_constraint_violation() {
        let mut conn = fixtures::db();
        let err = create(&mut conn, &milestone(404, "Orphan", 1)).unwrap_err();
        assert!(err.is_constraint_violation(), "{err}");
    }

    #[test]
    fn update_moves_date() {
        let mut conn = fixtures::db();
        let a = fixtures::program(&mut conn, "A");
        let id = create(&mut conn, &milestone(a, "PDR", 5))
            .unwrap()
            .id;
        let moved = update(
            &mut conn,
            id,
            &MilestonePatch {
                date: Some(fixtures::day(9)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(moved.date, fixtures::day(9));
        assert_eq!(moved.name, "PDR");
    }
}
