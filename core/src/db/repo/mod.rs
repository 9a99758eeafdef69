//! Repositories: plain functions over a borrowed connection, one module per
//! table family. Reads take `&Connection`; writes take `&mut Connection`
//! and run in their own IMMEDIATE transaction.

pub mod milestones;
pub mod part_numbers;
pub mod programs;
pub mod search;
pub mod teams;
pub mod users;
pub mod work_items;

use rusqlite::{OptionalExtension, Row};

use super::{DbError, Result};

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
}

fn query_one<T>(
    conn: &rusqlite::Connection,
    sql: &str,
    id: i64,
    entity: &'static str,
    map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<T> {
    conn.query_row(sql, [id], map)
        .optional()?
        .ok_or(DbError::NotFound { entity, id })
}

fn ensure_changed(changed: usize, entity: &'static str, id: i64) -> Result<()> {
    if changed == 0 {
        return Err(DbError::NotFound { entity, id });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use rusqlite::Connection;

    use crate::db::{migrate_to_latest, open_in_memory};
    use crate::pm::{NewPartNumber, NewProgram, NewUser, NewWorkItem, PartState, Priority, Status, WorkItemType};

    pub fn db() -> Connection {
        let mut conn = open_in_memory().unwrap();
        migrate_to_latest(&mut conn).unwrap();
        conn
    }

    pub fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0)
            .single()
            .unwrap()
    }

    pub fn user(conn: &mut Connection, username: &str) -> i64 {
        super::users::create(
            conn,
            &NewUser {
                username: username.to_string(),
                name: format!("{username} name"),
                email: format!("{username}@example.com"),
                phone_number: None,
                role: "Engineer".to_string(),
                profile_picture_url: None,
                discipline_team_id: None,
            },
        )
        .unwrap()
        .user_id
    }

    pub fn program(conn: &mut Connection, name: &str) -> i64 {
        super::programs::create(
            conn,
            &NewProgram {
                name: name.to_string(),
                description: None,
                program_manager_user_id: None,
                start_date: day(1),
                end_date: day(28),
            },
        )
        .unwrap()
        .id
    }

    pub fn new_part(program_id: i64, number: i64, parent_id: Option<i64>) -> NewPartNumber {
        NewPartNumber {
            number,
            part_name: format!("Part {number}"),
            level: 0,
            state: PartState::InWork,
            revision_level: "A".to_string(),
            assigned_user_id: None,
            program_id,
            parent_id,
        }
    }

    pub fn part(conn: &mut Connection, program_id: i64, number: i64, parent_id: Option<i64>) -> i64 {
        super::part_numbers::create(conn, &new_part(program_id, number, parent_id))
            .unwrap()
            .id
    }

    pub fn new_item(kind: WorkItemType, program_id: i64, author: i64) -> NewWorkItem {
        NewWorkItem {
            work_item_type: kind,
            title: format!("{kind} item"),
            description: None,
            status: Status::ToDo,
            priority: Priority::Medium,
            tags: None,
            date_opened: Some(day(1)),
            due_date: day(10),
            estimated_completion_date: None,
            actual_completion_date: None,
            percent_complete: 0,
            input_status: None,
            program_id,
            due_by_milestone_id: None,
            author_user_id: author,
            assigned_user_id: None,
            issue_detail: None,
            deliverable_detail: None,
            part_number_ids: Vec::new(),
        }
    }
}
