use rusqlite::{Connection, Row, params};

use super::{collect, ensure_changed, part_numbers, query_one, teams, work_items};
use crate::db::Result;
use crate::db::transactions::write;
use crate::pm::{NewUser, User, UserDetail, UserPatch};

const ENTITY: &str = "User";

const SELECT: &str = "SELECT id, username, name, email, phone_number, role, profile_picture_url,
            discipline_team_id
     FROM users";

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone_number: row.get(4)?,
        role: row.get(5)?,
        profile_picture_url: row.get(6)?,
        discipline_team_id: row.get(7)?,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY id"))?;
    collect(stmt.query_map([], from_row)?)
}

pub fn get(conn: &Connection, user_id: i64) -> Result<User> {
    query_one(conn, &format!("{SELECT} WHERE id = ?1"), user_id, ENTITY, from_row)
}

/// The user with their team, authored and assigned work items, and the
/// part numbers assigned to them.
pub fn get_detail(conn: &Connection, user_id: i64) -> Result<UserDetail> {
    let user = get(conn, user_id)?;
    let discipline_team = match user.discipline_team_id {
        Some(team_id) => Some(teams::get(conn, team_id)?),
        None => None,
    };
    let (authored_work_items, assigned_work_items) = work_items::list_by_user(conn, user_id)?
        .into_iter()
        .fold((Vec::new(), Vec::new()), |(mut authored, mut assigned), item| {
            if item.assigned_user_id == Some(user_id) {
                assigned.push(item.clone());
            }
            if item.author_user_id == user_id {
                authored.push(item);
            }
            (authored, assigned)
        });

    Ok(UserDetail {
        discipline_team,
        authored_work_items,
        assigned_work_items,
        part_numbers: part_numbers::list_by_user(conn, user_id)?,
        user,
    })
}

pub fn create(conn: &mut Connection, input: &NewUser) -> Result<User> {
    input.validate()?;
    write(conn, |tx| {
        tx.execute(
            "INSERT INTO users (username, name, email, phone_number, role, profile_picture_url,
                                discipline_team_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                input.username.trim(),
                input.name.trim(),
                input.email.trim(),
                input.phone_number,
                input.role,
                input.profile_picture_url,
                input.discipline_team_id,
            ],
        )?;
        let user_id = tx.last_insert_rowid();
        tracing::info!(user_id, "user created");
        get(tx, user_id)
    })
}

pub fn update(conn: &mut Connection, user_id: i64, patch: &UserPatch) -> Result<User> {
    patch.validate()?;
    write(conn, |tx| {
        let mut user = get(tx, user_id)?;
        if let Some(username) = &patch.username {
            user.username = username.trim().to_string();
        }
        if let Some(name) = &patch.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = &patch.email {
            user.email = email.trim().to_string();
        }
        if let Some(phone) = &patch.phone_number {
            user.phone_number.clone_from(phone);
        }
        if let Some(role) = &patch.role {
            user.role.clone_from(role);
        }
        if let Some(url) = &patch.profile_picture_url {
            user.profile_picture_url.clone_from(url);
        }
        if let Some(team_id) = patch.discipline_team_id {
            user.discipline_team_id = team_id;
        }

        tx.execute(
            "UPDATE users
             SET username = ?2, name = ?3, email = ?4, phone_number = ?5, role = ?6,
                 profile_picture_url = ?7, discipline_team_id = ?8
             WHERE id = ?1",
            params![
                user_id,
                user.username,
                user.name,
                user.email,
                user.phone_number,
                user.role,
                user.profile_picture_url,
                user.discipline_team_id,
            ],
        )?;
        Ok(user)
    })
}

/// Fails with a constraint violation while the user still authors work items.
pub fn delete(conn: &mut Connection, user_id: i64) -> Result<()> {
    write(conn, |tx| {
        let changed = tx.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
        ensure_changed(changed, ENTITY, user_id)?;
        tracing::info!(user_id, "user deleted");
        Ok(())
    })
}
