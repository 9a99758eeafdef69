use rusqlite::{Connection, Row, params};

use super::{collect, ensure_changed, query_one};
use crate::db::Result;
use crate::db::transactions::write;
use crate::pm::{DisciplineTeam, NewTeam, TeamPatch, TeamSummary};

const ENTITY: &str = "DisciplineTeam";

const SELECT: &str =
    "SELECT id, name, description, team_manager_user_id FROM discipline_teams";

fn from_row(row: &Row<'_>) -> rusqlite::Result<DisciplineTeam> {
    Ok(DisciplineTeam {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        team_manager_user_id: row.get(3)?,
    })
}

/// Teams with the manager's username resolved.
pub fn list(conn: &Connection) -> Result<Vec<TeamSummary>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.description, t.team_manager_user_id, u.username
         FROM discipline_teams t
         LEFT JOIN users u ON u.id = t.team_manager_user_id
         ORDER BY t.id",
    )?;
    collect(stmt.query_map([], |row| {
        Ok(TeamSummary {
            team: from_row(row)?,
            team_manager_username: row.get(4)?,
        })
    })?)
}

pub fn list_plain(conn: &Connection) -> Result<Vec<DisciplineTeam>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY id"))?;
    collect(stmt.query_map([], from_row)?)
}

pub fn get(conn: &Connection, id: i64) -> Result<DisciplineTeam> {
    query_one(conn, &format!("{SELECT} WHERE id = ?1"), id, ENTITY, from_row)
}

pub fn create(conn: &mut Connection, input: &NewTeam) -> Result<DisciplineTeam> {
    input.validate()?;
    write(conn, |tx| {
        tx.execute(
            "INSERT INTO discipline_teams (name, description, team_manager_user_id)
             VALUES (?1, ?2, ?3)",
            params![
                input.name.trim(),
                input.description,
                input.team_manager_user_id
            ],
        )?;
        get(tx, tx.last_insert_rowid())
    })
}

pub fn update(conn: &mut Connection, id: i64, patch: &TeamPatch) -> Result<DisciplineTeam> {
    patch.validate()?;
    write(conn, |tx| {
        let mut team = get(tx, id)?;
        if let Some(name) = &patch.name {
            team.name = name.trim().to_string();
        }
        if let Some(description) = &patch.description {
            team.description.clone_from(description);
        }
        if let Some(manager) = patch.team_manager_user_id {
            team.team_manager_user_id = manager;
        }
        tx.execute(
            "UPDATE discipline_teams SET name = ?2, description = ?3, team_manager_user_id = ?4
             WHERE id = ?1",
            params![id, team.name, team.description, team.team_manager_user_id],
        )?;
        Ok(team)
    })
}

/// Members keep their accounts and lose the team reference.
pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
    write(conn, |tx| {
        let changed = tx.execute("DELETE FROM discipline_teams WHERE id = ?1", [id])?;
        ensure_changed(changed, ENTITY, id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::{fixtures, users};

    #[test]
    fn list_resolves_manager_username() {
        let mut conn = fixtures::db();
        let ada = fixtures::user(&mut conn, "ada");
        create(
            &mut conn,
            &NewTeam {
                name: "Structures".to_string(),
                description: Some("Loads and stress".to_string()),
                team_manager_user_id: Some(ada),
            },
        )
        .unwrap();
        create(
            &mut conn,
            &NewTeam {
                name: "Thermal".to_string(),
                description: None,
                team_manager_user_id: None,
            },
        )
        .unwrap();

        let teams = list(&conn).unwrap();
        let managers: Vec<Option<&str>> = teams
            .iter()
            .map(|t| t.team_manager_username.as_deref())
            .collect();
        assert_eq!(managers, vec![Some("ada"), None]);

        let json = serde_json::to_value(&teams[0]).unwrap();
        assert_eq!(json["name"], "Structures");
        assert_eq!(json["teamManagerUsername"], "ada");
    }

    #[test]
    fn deleting_team_detaches_members() {
        let mut conn = fixtures::db();
        let ada = fixtures::user(&mut conn, "ada");
        let team = create(
            &mut conn,
            &NewTeam {
                name: "GNC".to_string(),
                description: None,
                team_manager_user_id: None,
            },
        )
        .unwrap();
        users::update(
            &mut conn,
            ada,
            &crate::pm::UserPatch {
                discipline_team_id: Some(Some(team.id)),
                ..Default::default()
            },
        )
        .unwrap();

        delete(&mut conn, team.id).unwrap();
        let user = users::get(&conn, ada).unwrap();
        assert_eq!(user.discipline_team_id, None);
    }
}
