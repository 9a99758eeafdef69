//! Dashboard distributions over an already-loaded slice of work items.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use strum::IntoEnumIterator;

use super::enums::{Priority, Status, WorkItemType};
use super::records::{DisciplineTeam, Milestone, User, WorkItem};

pub const UNASSIGNED: &str = "Unassigned";

/// Milestones this many days out or closer are flagged as upcoming.
const UPCOMING_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneProgress {
    pub id: i64,
    pub name: String,
    pub program_id: i64,
    pub date: NaiveDate,
    pub work_item_count: u32,
    pub days_until: i64,
    pub is_past: bool,
    pub is_upcoming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total: u32,
    pub by_team: Vec<Bucket>,
    pub by_priority: Vec<Bucket>,
    pub by_type: Vec<Bucket>,
    pub by_status: Vec<Bucket>,
    pub milestones: Vec<MilestoneProgress>,
}

/// Everything the dashboard needs, borrowed from the caller.
pub struct DashboardInput<'a> {
    pub items: &'a [WorkItem],
    pub users: &'a [User],
    pub teams: &'a [DisciplineTeam],
    pub milestones: &'a [Milestone],
    pub today: NaiveDate,
    /// Drop completed items before counting.
    pub open_only: bool,
}

pub fn summarize(input: &DashboardInput<'_>) -> DashboardSummary {
    let items: Vec<&WorkItem> = input
        .items
        .iter()
        .filter(|i| !input.open_only || i.status.is_open())
        .collect();

    DashboardSummary {
        total: items.len() as u32,
        by_team: by_team(&items, input.users, input.teams),
        by_priority: by_enum(&items, |i: &WorkItem| i.priority, Priority::iter(), Priority::label),
        by_type: by_enum(
            &items,
            |i: &WorkItem| i.work_item_type,
            WorkItemType::iter(),
            WorkItemType::label,
        ),
        by_status: by_enum(&items, |i: &WorkItem| i.status, Status::iter(), Status::label),
        milestones: milestone_progress(&items, input.milestones, input.today),
    }
}

fn by_team(items: &[&WorkItem], users: &[User], teams: &[DisciplineTeam]) -> Vec<Bucket> {
    let team_of_user: HashMap<i64, Option<i64>> = users
        .iter()
        .map(|u| (u.user_id, u.discipline_team_id))
        .collect();
    let team_names: HashMap<i64, &str> = teams.iter().map(|t| (t.id, t.name.as_str())).collect();

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for item in items {
        let name = item
            .assigned_user_id
            .and_then(|u| team_of_user.get(&u).copied().flatten())
            .and_then(|t| team_names.get(&t).copied())
            .unwrap_or(UNASSIGNED);
        *counts.entry(name).or_default() += 1;
    }

    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(name, count)| Bucket {
            name: name.to_string(),
            count,
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    buckets
}

fn by_enum<E, I>(
    items: &[&WorkItem],
    key: impl Fn(&WorkItem) -> E,
    order: I,
    label: fn(E) -> &'static str,
) -> Vec<Bucket>
where
    E: PartialEq + Copy,
    I: Iterator<Item = E>,
{
    order
        .filter_map(|value| {
            let count = items.iter().filter(|i| key(i) == value).count() as u32;
            (count > 0).then(|| Bucket {
                name: label(value).to_string(),
                count,
            })
        })
        .collect()
}

fn milestone_progress(
    items: &[&WorkItem],
    milestones: &[Milestone],
    today: NaiveDate,
) -> Vec<MilestoneProgress> {
    let mut ordered: Vec<&Milestone> = milestones.iter().collect();
    ordered.sort_by_key(|m| (m.date, m.id));
    ordered
        .into_iter()
        .map(|m| {
            let date = m.date.date_naive();
            let days_until = (date - today).num_days();
            MilestoneProgress {
                id: m.id,
                name: m.name.clone(),
                program_id: m.program_id,
                date,
                work_item_count: items
                    .iter()
                    .filter(|i| i.due_by_milestone_id == Some(m.id))
                    .count() as u32,
                days_until,
                is_past: days_until < 0,
                is_upcoming: (0..=UPCOMING_WINDOW_DAYS).contains(&days_until),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(day: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, day, 0, 0, 0)
            .single()
            .unwrap()
    }

    fn item(id: i64, status: Status, priority: Priority, assignee: Option<i64>) -> WorkItem {
        WorkItem {
            id,
            work_item_type: WorkItemType::Task,
            title: format!("item {id}"),
            description: None,
            status,
            priority,
            tags: None,
            date_opened: at(1),
            due_date: at(20),
            estimated_completion_date: None,
            actual_completion_date: None,
            percent_complete: 0,
            input_status: None,
            program_id: 1,
            due_by_milestone_id: None,
            author_user_id: 1,
            assigned_user_id: assignee,
            issue_detail: None,
            deliverable_detail: None,
            part_number_ids: Vec::new(),
        }
    }

    fn user(user_id: i64, team: Option<i64>) -> User {
        User {
            user_id,
            username: format!("u{user_id}"),
            name: format!("User {user_id}"),
            email: format!("u{user_id}@example.com"),
            phone_number: None,
            role: "Engineer".to_string(),
            profile_picture_url: None,
            discipline_team_id: team,
        }
    }

    fn team(id: i64, name: &str) -> DisciplineTeam {
        DisciplineTeam {
            id,
            name: name.to_string(),
            description: None,
            team_manager_user_id: None,
        }
    }

    #[test]
    fn team_distribution_sorted_by_count() {
        let items = vec![
            item(1, Status::ToDo, Priority::High, Some(10)),
            item(2, Status::ToDo, Priority::High, Some(11)),
            item(3, Status::ToDo, Priority::Low, Some(11)),
            item(4, Status::ToDo, Priority::Low, None),
            item(5, Status::ToDo, Priority::Low, Some(12)),
        ];
        let users = vec![user(10, Some(1)), user(11, Some(2)), user(12, None)];
        let teams = vec![team(1, "Avionics"), team(2, "Structures")];
        let summary = summarize(&DashboardInput {
            items: &items,
            users: &users,
            teams: &teams,
            milestones: &[],
            today: at(1).date_naive(),
            open_only: false,
        });

        let teams: Vec<(&str, u32)> = summary
            .by_team
            .iter()
            .map(|b| (b.name.as_str(), b.count))
            .collect();
        assert_eq!(
            teams,
            vec![("Structures", 2), ("Unassigned", 2), ("Avionics", 1)]
        );
    }

    #[test]
    fn open_only_drops_completed() {
        let items = vec![
            item(1, Status::Completed, Priority::Urgent, None),
            item(2, Status::UnderReview, Priority::Urgent, None),
            item(3, Status::ToDo, Priority::Backlog, None),
        ];
        let summary = summarize(&DashboardInput {
            items: &items,
            users: &[],
            teams: &[],
            milestones: &[],
            today: at(1).date_naive(),
            open_only: true,
        });

        assert_eq!(summary.total, 2);
        assert_eq!(
            summary.by_priority,
            vec![
                Bucket {
                    name: "Urgent".to_string(),
                    count: 1
                },
                Bucket {
                    name: "Backlog".to_string(),
                    count: 1
                },
            ]
        );
        assert!(summary.by_status.iter().all(|b| b.name != "Completed"));
        assert_eq!(summary.by_type[0].count, 2);
    }

    #[test]
    fn milestones_ordered_with_counts() {
        let mut linked = item(1, Status::ToDo, Priority::Medium, None);
        linked.due_by_milestone_id = Some(8);
        let milestones = vec![
            Milestone {
                id: 7,
                name: "CDR".to_string(),
                description: None,
                date: at(25),
                program_id: 1,
            },
            Milestone {
                id: 8,
                name: "PDR".to_string(),
                description: None,
                date: at(5),
                program_id: 1,
            },
        ];
        let summary = summarize(&DashboardInput {
            items: &[linked],
            users: &[],
            teams: &[],
            milestones: &milestones,
            today: at(10).date_naive(),
            open_only: false,
        });

        let names: Vec<&str> = summary.milestones.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["PDR", "CDR"]);
        let pdr = &summary.milestones[0];
        assert_eq!((pdr.work_item_count, pdr.days_until, pdr.is_past), (1, -5, true));
        let cdr = &summary.milestones[1];
        assert_eq!((cdr.days_until, cdr.is_upcoming), (15, true));
    }
}
