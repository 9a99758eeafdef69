//! Stored records as they travel over the API.
//!
//! Field names are camelCase on the wire. Ids are SQLite row ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{DeliverableType, IssueType, PartState, Priority, Status, WorkItemType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub program_manager_user_id: Option<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub program_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub profile_picture_url: Option<String>,
    pub discipline_team_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisciplineTeam {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub team_manager_user_id: Option<i64>,
}

/// Team row as listed, with the manager's username resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    #[serde(flatten)]
    pub team: DisciplineTeam,
    pub team_manager_username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PartNumber {
    pub id: i64,
    pub number: i64,
    pub part_name: String,
    pub level: i64,
    pub state: PartState,
    pub revision_level: String,
    pub assigned_user_id: Option<i64>,
    pub program_id: i64,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetail {
    pub issue_type: IssueType,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub corrective_action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableDetail {
    pub deliverable_type: DeliverableType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: i64,
    pub work_item_type: WorkItemType,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub tags: Option<String>,
    pub date_opened: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub estimated_completion_date: Option<DateTime<Utc>>,
    pub actual_completion_date: Option<DateTime<Utc>>,
    pub percent_complete: u8,
    pub input_status: Option<String>,
    pub program_id: i64,
    pub due_by_milestone_id: Option<i64>,
    pub author_user_id: i64,
    pub assigned_user_id: Option<i64>,
    pub issue_detail: Option<IssueDetail>,
    pub deliverable_detail: Option<DeliverableDetail>,
    #[serde(default)]
    pub part_number_ids: Vec<i64>,
}

/// A user with everything that points at them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub discipline_team: Option<DisciplineTeam>,
    pub authored_work_items: Vec<WorkItem>,
    pub assigned_work_items: Vec<WorkItem>,
    pub part_numbers: Vec<PartNumber>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub work_items: Vec<WorkItem>,
    pub programs: Vec<Program>,
    pub users: Vec<User>,
    pub milestones: Vec<Milestone>,
    pub part_numbers: Vec<PartNumber>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.work_items.is_empty()
            && self.programs.is_empty()
            && self.users.is_empty()
            && self.milestones.is_empty()
            && self.part_numbers.is_empty()
    }
}
