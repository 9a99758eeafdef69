//! Work items with their subtype details and part-number links.
//!
//! Create, edit and delete touch up to four tables each and always run in a
//! single transaction: an edit that fails halfway leaves the previous link
//! set and details in place.

use chrono::Utc;
use rusqlite::{Connection, Row, params};

use super::{collect, ensure_changed, query_one};
use crate::db::Result;
use crate::db::transactions::write;
use crate::pm::{
    DeliverableDetail, IssueDetail, NewWorkItem, Status, WorkItem, WorkItemPatch, WorkItemType,
};

const ENTITY: &str = "WorkItem";

const SELECT: &str = "SELECT w.id, w.work_item_type, w.title, w.description, w.status, w.priority,
            w.tags, w.date_opened, w.due_date, w.estimated_completion_date,
            w.actual_completion_date, w.percent_complete, w.input_status, w.program_id,
            w.due_by_milestone_id, w.author_user_id, w.assigned_user_id,
            i.issue_type, i.root_cause, i.corrective_action, d.deliverable_type
     FROM work_items w
     LEFT JOIN issue_details i ON i.work_item_id = w.id
     LEFT JOIN deliverable_details d ON d.work_item_id = w.id";

/// Which work items to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkItemFilter {
    pub program_id: Option<i64>,
    pub part_number_id: Option<i64>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<WorkItem> {
    let issue_detail = row
        .get::<_, Option<_>>(17)?
        .map(|issue_type| -> rusqlite::Result<IssueDetail> {
            Ok(IssueDetail {
                issue_type,
                root_cause: row.get(18)?,
                corrective_action: row.get(19)?,
            })
        })
        .transpose()?;
    let deliverable_detail = row
        .get::<_, Option<_>>(20)?
        .map(|deliverable_type| DeliverableDetail { deliverable_type });

    Ok(WorkItem {
        id: row.get(0)?,
        work_item_type: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        tags: row.get(6)?,
        date_opened: row.get(7)?,
        due_date: row.get(8)?,
        estimated_completion_date: row.get(9)?,
        actual_completion_date: row.get(10)?,
        percent_complete: row.get(11)?,
        input_status: row.get(12)?,
        program_id: row.get(13)?,
        due_by_milestone_id: row.get(14)?,
        author_user_id: row.get(15)?,
        assigned_user_id: row.get(16)?,
        issue_detail,
        deliverable_detail,
        part_number_ids: Vec::new(),
    })
}

fn attach_links(conn: &Connection, items: &mut [WorkItem]) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT part_number_id FROM work_item_part_numbers
         WHERE work_item_id = ?1 ORDER BY part_number_id",
    )?;
    for item in items.iter_mut() {
        item.part_number_ids = collect(stmt.query_map([item.id], |row| row.get(0))?)?;
    }
    Ok(())
}

pub(super) fn query(
    conn: &Connection,
    clause: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<WorkItem>> {
    let mut stmt = conn.prepare(&format!("{SELECT} {clause} ORDER BY w.due_date, w.id"))?;
    let mut items = collect(stmt.query_map(params, from_row)?)?;
    attach_links(conn, &mut items)?;
    Ok(items)
}

/// Lists work items. A program filter takes precedence over a part filter.
pub fn list(conn: &Connection, filter: WorkItemFilter) -> Result<Vec<WorkItem>> {
    match filter {
        WorkItemFilter {
            program_id: Some(program_id),
            ..
        } => query(conn, "WHERE w.program_id = ?1", [program_id]),
        WorkItemFilter {
            part_number_id: Some(part_id),
            ..
        } => query(
            conn,
            "WHERE w.id IN (SELECT work_item_id FROM work_item_part_numbers
                            WHERE part_number_id = ?1)",
            [part_id],
        ),
        _ => query(conn, "", []),
    }
}

/// Items the user authored or is assigned to.
pub fn list_by_user(conn: &Connection, user_id: i64) -> Result<Vec<WorkItem>> {
    query(
        conn,
        "WHERE w.author_user_id = ?1 OR w.assigned_user_id = ?1",
        [user_id],
    )
}

pub fn get(conn: &Connection, id: i64) -> Result<WorkItem> {
    let mut item = query_one(conn, &format!("{SELECT} WHERE w.id = ?1"), id, ENTITY, from_row)?;
    attach_links(conn, std::slice::from_mut(&mut item))?;
    Ok(item)
}

/// `(part id, work item kind)` for every link, optionally limited to parts
/// of one program. Feeds the hierarchy rollups.
pub fn part_links(conn: &Connection, program_id: Option<i64>) -> Result<Vec<(i64, WorkItemType)>> {
    let mut stmt = conn.prepare(
        "SELECT l.part_number_id, w.work_item_type
         FROM work_item_part_numbers l
         JOIN work_items w ON w.id = l.work_item_id
         JOIN part_numbers p ON p.id = l.part_number_id
         WHERE ?1 IS NULL OR p.program_id = ?1",
    )?;
    collect(stmt.query_map([program_id], |row| Ok((row.get(0)?, row.get(1)?)))?)
}

fn replace_links(conn: &Connection, id: i64, part_ids: &[i64]) -> Result<()> {
    conn.execute(
        "DELETE FROM work_item_part_numbers WHERE work_item_id = ?1",
        [id],
    )?;
    let mut insert = conn.prepare_cached(
        "INSERT OR IGNORE INTO work_item_part_numbers (work_item_id, part_number_id)
         VALUES (?1, ?2)",
    )?;
    for part_id in part_ids {
        insert.execute([id, *part_id])?;
    }
    Ok(())
}

fn upsert_issue(conn: &Connection, id: i64, detail: &IssueDetail) -> Result<()> {
    conn.execute(
        "INSERT INTO issue_details (work_item_id, issue_type, root_cause, corrective_action)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(work_item_id) DO UPDATE SET
             issue_type = excluded.issue_type,
             root_cause = excluded.root_cause,
             corrective_action = excluded.corrective_action",
        params![
            id,
            detail.issue_type,
            detail.root_cause,
            detail.corrective_action
        ],
    )?;
    Ok(())
}

fn upsert_deliverable(conn: &Connection, id: i64, detail: &DeliverableDetail) -> Result<()> {
    conn.execute(
        "INSERT INTO deliverable_details (work_item_id, deliverable_type)
         VALUES (?1, ?2)
         ON CONFLICT(work_item_id) DO UPDATE SET deliverable_type = excluded.deliverable_type",
        params![id, detail.deliverable_type],
    )?;
    Ok(())
}

pub fn create(conn: &mut Connection, input: &NewWorkItem) -> Result<WorkItem> {
    input.validate()?;
    write(conn, |tx| {
        tx.execute(
            "INSERT INTO work_items (work_item_type, title, description, status, priority, tags,
                                     date_opened, due_date, estimated_completion_date,
                                     actual_completion_date, percent_complete, input_status,
                                     program_id, due_by_milestone_id, author_user_id,
                                     assigned_user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                input.work_item_type,
                input.title.trim(),
                input.description,
                input.status,
                input.priority,
                input.tags,
                input.date_opened.unwrap_or_else(Utc::now),
                input.due_date,
                input.estimated_completion_date,
                input.actual_completion_date,
                input.percent_complete,
                input.input_status,
                input.program_id,
                input.due_by_milestone_id,
                input.author_user_id,
                input.assigned_user_id,
            ],
        )?;
        let id = tx.last_insert_rowid();

        if let Some(detail) = &input.issue_detail {
            upsert_issue(tx, id, detail)?;
        }
        if let Some(detail) = &input.deliverable_detail {
            upsert_deliverable(tx, id, detail)?;
        }
        replace_links(tx, id, &input.part_number_ids)?;

        tracing::info!(
            work_item_id = id,
            program_id = input.program_id,
            kind = %input.work_item_type,
            links = input.part_number_ids.len(),
            "work item created"
        );
        get(tx, id)
    })
}

pub fn update_status(conn: &mut Connection, id: i64, status: Status) -> Result<WorkItem> {
    write(conn, |tx| {
        let changed = tx.execute(
            "UPDATE work_items SET status = ?2 WHERE id = ?1",
            params![id, status],
        )?;
        ensure_changed(changed, ENTITY, id)?;
        tracing::info!(work_item_id = id, %status, "work item status changed");
        get(tx, id)
    })
}

/// Applies the fields present in `patch`. A present `partNumberIds`
/// replaces the whole link set.
pub fn update(conn: &mut Connection, id: i64, patch: &WorkItemPatch) -> Result<WorkItem> {
    write(conn, |tx| {
        let mut item = get(tx, id)?;
        patch.validate_for(item.work_item_type)?;

        if let Some(title) = &patch.title {
            item.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            item.description.clone_from(description);
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        if let Some(priority) = patch.priority {
            item.priority = priority;
        }
        if let Some(tags) = &patch.tags {
            item.tags.clone_from(tags);
        }
        if let Some(opened) = patch.date_opened {
            item.date_opened = opened;
        }
        if let Some(due) = patch.due_date {
            item.due_date = due;
        }
        if let Some(estimated) = patch.estimated_completion_date {
            item.estimated_completion_date = estimated;
        }
        if let Some(actual) = patch.actual_completion_date {
            item.actual_completion_date = actual;
        }
        if let Some(pct) = patch.percent_complete {
            item.percent_complete = pct;
        }
        if let Some(input_status) = &patch.input_status {
            item.input_status.clone_from(input_status);
        }
        if let Some(program_id) = patch.program_id {
            item.program_id = program_id;
        }
        if let Some(milestone_id) = patch.due_by_milestone_id {
            item.due_by_milestone_id = milestone_id;
        }
        if let Some(assignee) = patch.assigned_user_id {
            item.assigned_user_id = assignee;
        }

        tx.execute(
            "UPDATE work_items
             SET title = ?2, description = ?3, status = ?4, priority = ?5, tags = ?6,
                 date_opened = ?7, due_date = ?8, estimated_completion_date = ?9,
                 actual_completion_date = ?10, percent_complete = ?11, input_status = ?12,
                 program_id = ?13, due_by_milestone_id = ?14, assigned_user_id = ?15
             WHERE id = ?1",
            params![
                id,
                item.title,
                item.description,
                item.status,
                item.priority,
                item.tags,
                item.date_opened,
                item.due_date,
                item.estimated_completion_date,
                item.actual_completion_date,
                item.percent_complete,
                item.input_status,
                item.program_id,
                item.due_by_milestone_id,
                item.assigned_user_id,
            ],
        )?;

        if let Some(detail) = &patch.issue_detail {
            upsert_issue(tx, id, detail)?;
        }
        if let Some(detail) = &patch.deliverable_detail {
            upsert_deliverable(tx, id, detail)?;
        }
        if let Some(part_ids) = &patch.part_number_ids {
            replace_links(tx, id, part_ids)?;
            tracing::debug!(work_item_id = id, links = part_ids.len(), "part links replaced");
        }

        get(tx, id)
    })
}

/// Removes the item together with its links and subtype details.
pub fn delete(conn: &mut Connection, id: i64) -> Result<()> {
    write(conn, |tx| {
        tx.execute(
            "DELETE FROM work_item_part_numbers WHERE work_item_id = ?1",
            [id],
        )?;
        tx.execute("DELETE FROM issue_details WHERE work_item_id = ?1", [id])?;
        tx.execute(
            "DELETE FROM deliverable_details WHERE work_item_id = ?1",
            [id],
        )?;
        let changed = tx.execute("DELETE FROM work_items WHERE id = ?1", [id])?;
        ensure_changed(changed, ENTITY, id)?;
        tracing::info!(work_item_id = id, "work item deleted");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::db::repo::fixtures;
    use crate::pm::{DeliverableType, IssueType};
    use pretty_assertions::assert_eq;

    struct Seed {
        conn: Connection,
        program: i64,
        author: i64,
        parts: Vec<i64>,
    }

    fn seed() -> Seed {
        let mut conn = fixtures::db();
        let author = fixtures::user(&mut conn, "ada");
        let program = fixtures::program(&mut conn, "Rover");
        let root = fixtures::part(&mut conn, program, 1, None);
        let child = fixtures::part(&mut conn, program, 2, Some(root));
        Seed {
            conn,
            program,
            author,
            parts: vec![root, child],
        }
    }

    fn link_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM work_item_part_numbers", [], |r| r.get(0))
            .unwrap_or(-1)
    }

    #[test]
    fn create_persists_details_and_links() {
        let mut s = seed();
        let mut input = fixtures::new_item(WorkItemType::Issue, s.program, s.author);
        input.issue_detail = Some(IssueDetail {
            issue_type: IssueType::TestVerificationAnomaly,
            root_cause: Some("Loose connector".to_string()),
            corrective_action: None,
        });
        input.part_number_ids = vec![s.parts[1], s.parts[0], s.parts[1]];

        let item = create(&mut s.conn, &input).unwrap();
        assert_eq!(item.part_number_ids, vec![s.parts[0], s.parts[1]]);
        assert_eq!(
            item.issue_detail.as_ref().map(|d| d.issue_type),
            Some(IssueType::TestVerificationAnomaly)
        );
        assert_eq!(item.deliverable_detail, None);
        assert_eq!(get(&s.conn, item.id).ok(), Some(item));
    }

    #[test]
    fn create_with_unknown_part_rolls_back() {
        let mut s = seed();
        let mut input = fixtures::new_item(WorkItemType::Task, s.program, s.author);
        input.part_number_ids = vec![s.parts[0], 999];

        let err = create(&mut s.conn, &input).unwrap_err();
        assert!(err.is_constraint_violation(), "{err}");
        assert_eq!(list(&s.conn, WorkItemFilter::default()).map(|v| v.len()).ok(), Some(0));
        assert_eq!(link_count(&s.conn), 0);
    }

    #[test]
    fn filters_by_program_then_part() {
        let mut s = seed();
        let other_program = fixtures::program(&mut s.conn, "Lander");
        let mut linked = fixtures::new_item(WorkItemType::Task, s.program, s.author);
        linked.part_number_ids = vec![s.parts[1]];
        let linked = create(&mut s.conn, &linked).unwrap();
        create(
            &mut s.conn,
            &fixtures::new_item(WorkItemType::Task, s.program, s.author),
        )
        .unwrap();
        create(
            &mut s.conn,
            &fixtures::new_item(WorkItemType::Task, other_program, s.author),
        )
        .unwrap();

        let by_program = list(
            &s.conn,
            WorkItemFilter {
                program_id: Some(s.program),
                part_number_id: Some(s.parts[1]),
            },
        )
        .unwrap();
        assert_eq!(by_program.len(), 2, "program filter wins");

        let by_part = list(
            &s.conn,
            WorkItemFilter {
                program_id: None,
                part_number_id: Some(s.parts[1]),
            },
        )
        .unwrap();
        assert_eq!(by_part.iter().map(|w| w.id).collect::<Vec<_>>(), vec![linked.id]);
    }

    #[test]
    fn list_by_user_matches_author_or_assignee() {
        let mut s = seed();
        let bob = fixtures::user(&mut s.conn, "bob");
        let carol = fixtures::user(&mut s.conn, "carol");
        let mut assigned = fixtures::new_item(WorkItemType::Task, s.program, s.author);
        assigned.assigned_user_id = Some(bob);
        create(&mut s.conn, &assigned).unwrap();
        create(&mut s.conn, &fixtures::new_item(WorkItemType::Task, s.program, bob))
            .unwrap();
        create(&mut s.conn, &fixtures::new_item(WorkItemType::Task, s.program, carol))
            .unwrap();

        assert_eq!(list_by_user(&s.conn, bob).map(|v| v.len()).ok(), Some(2));
        assert_eq!(list_by_user(&s.conn, carol).map(|v| v.len()).ok(), Some(1));
    }

    #[test]
    fn update_applies_present_fields_and_replaces_links() {
        let mut s = seed();
        let mut input = fixtures::new_item(WorkItemType::Deliverable, s.program, s.author);
        input.part_number_ids = vec![s.parts[0]];
        input.description = Some("Draft".to_string());
        let item = create(&mut s.conn, &input).unwrap();

        let updated = update(
            &mut s.conn,
            item.id,
            &WorkItemPatch {
                percent_complete: Some(40),
                deliverable_detail: Some(DeliverableDetail {
                    deliverable_type: DeliverableType::ThermalAnalysisReport,
                }),
                part_number_ids: Some(vec![s.parts[1]]),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.percent_complete, 40);
        assert_eq!(updated.description.as_deref(), Some("Draft"));
        assert_eq!(updated.title, item.title);
        assert_eq!(updated.part_number_ids, vec![s.parts[1]]);
        assert_eq!(
            updated.deliverable_detail.map(|d| d.deliverable_type),
            Some(DeliverableType::ThermalAnalysisReport)
        );

        let untouched = update(&mut s.conn, item.id, &WorkItemPatch::default())
            .unwrap();
        assert_eq!(untouched.part_number_ids, vec![s.parts[1]]);

        let cleared = update(
            &mut s.conn,
            item.id,
            &WorkItemPatch {
                part_number_ids: Some(Vec::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(cleared.part_number_ids.is_empty());
    }

    #[test]
    fn failed_update_keeps_previous_links() {
        let mut s = seed();
        let mut input = fixtures::new_item(WorkItemType::Task, s.program, s.author);
        input.part_number_ids = vec![s.parts[0]];
        let item = create(&mut s.conn, &input).unwrap();

        let err = update(
            &mut s.conn,
            item.id,
            &WorkItemPatch {
                title: Some("Renamed".to_string()),
                part_number_ids: Some(vec![s.parts[1], 4242]),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.is_constraint_violation(), "{err}");

        let stored = get(&s.conn, item.id).unwrap();
        assert_eq!(stored.title, item.title);
        assert_eq!(stored.part_number_ids, vec![s.parts[0]]);
    }

    #[test]
    fn update_rejects_mismatched_detail() {
        let mut s = seed();
        let item = create(
            &mut s.conn,
            &fixtures::new_item(WorkItemType::Task, s.program, s.author),
        )
        .unwrap();
        let err = update(
            &mut s.conn,
            item.id,
            &WorkItemPatch {
                issue_detail: Some(IssueDetail {
                    issue_type: IssueType::Defect,
                    root_cause: None,
                    corrective_action: None,
                }),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));
    }

    #[test]
    fn explicit_null_clears_nullable_fields() {
        let mut s = seed();
        let bob = fixtures::user(&mut s.conn, "bob");
        let milestone = crate::db::repo::milestones::create(
            &mut s.conn,
            &crate::pm::NewMilestone {
                name: "CDR".to_string(),
                description: None,
                date: fixtures::day(20),
                program_id: s.program,
            },
        )
        .unwrap();
        let mut input = fixtures::new_item(WorkItemType::Task, s.program, s.author);
        input.assigned_user_id = Some(bob);
        input.due_by_milestone_id = Some(milestone.id);
        input.actual_completion_date = Some(fixtures::day(3));
        input.tags = Some("thermal".to_string());
        let item = create(&mut s.conn, &input).unwrap();

        let patch: WorkItemPatch = serde_json::from_value(serde_json::json!({
            "assignedUserId": null,
            "actualCompletionDate": null,
            "dueByMilestoneId": null
        }))
        .unwrap();
        let cleared = update(&mut s.conn, item.id, &patch).unwrap();

        assert_eq!(cleared.assigned_user_id, None);
        assert_eq!(cleared.due_by_milestone_id, None);
        assert_eq!(cleared.actual_completion_date, None);
        assert_eq!(cleared.tags.as_deref(), Some("thermal"), "absent keys are kept");
        assert_eq!(get(&s.conn, item.id).ok(), Some(cleared));
    }

    #[test]
    fn status_update_and_delete() {
        let mut s = seed();
        let mut input = fixtures::new_item(WorkItemType::Issue, s.program, s.author);
        input.issue_detail = Some(IssueDetail {
            issue_type: IssueType::Defect,
            root_cause: None,
            corrective_action: None,
        });
        input.part_number_ids = s.parts.clone();
        let item = create(&mut s.conn, &input).unwrap();

        let done = update_status(&mut s.conn, item.id, Status::Completed)
            .unwrap();
        assert_eq!(done.status, Status::Completed);
        assert!(matches!(
            update_status(&mut s.conn, 777, Status::ToDo),
            Err(DbError::NotFound { .. })
        ));

        delete(&mut s.conn, item.id).unwrap();
        assert_eq!(link_count(&s.conn), 0);
        let details: i64 = s
            .conn
            .query_row("SELECT COUNT(*) FROM issue_details", [], |r| r.get(0))
            .unwrap_or(-1);
        assert_eq!(details, 0);
        assert!(matches!(get(&s.conn, item.id), Err(DbError::NotFound { .. })));
    }

    #[test]
    fn part_links_feed_rollups() {
        let mut s = seed();
        let mut deliverable = fixtures::new_item(WorkItemType::Deliverable, s.program, s.author);
        deliverable.part_number_ids = s.parts.clone();
        create(&mut s.conn, &deliverable).unwrap();

        let mut links = part_links(&s.conn, Some(s.program)).unwrap();
        links.sort_unstable();
        assert_eq!(
            links,
            vec![
                (s.parts[0], WorkItemType::Deliverable),
                (s.parts[1], WorkItemType::Deliverable)
            ]
        );
        assert!(part_links(&s.conn, Some(s.program + 100)).unwrap().is_empty());
    }
}
