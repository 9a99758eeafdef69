//! Create and partial-update payloads.
//!
//! `New*` structs carry what an insert needs; storage assigns the id.
//! `*Patch` structs carry every mutable field as `Option`, where `None`
//! leaves the stored value untouched.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::dates;
use super::enums::{PartState, Priority, Status, WorkItemType};
use super::records::{DeliverableDetail, IssueDetail};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{detail} is not allowed on a {kind} work item")]
    DetailMismatch {
        kind: WorkItemType,
        detail: &'static str,
    },
}

/// Marks a key as present even when its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

fn require_opt_text(field: &'static str, value: Option<&String>) -> Result<(), ValidationError> {
    match value {
        Some(v) => require_text(field, v),
        None => Ok(()),
    }
}

fn require_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Subtype payloads must agree with the work item kind.
fn check_details(
    kind: WorkItemType,
    issue: Option<&IssueDetail>,
    deliverable: Option<&DeliverableDetail>,
) -> Result<(), ValidationError> {
    if issue.is_some() && kind != WorkItemType::Issue {
        return Err(ValidationError::DetailMismatch {
            kind,
            detail: "issueDetail",
        });
    }
    if deliverable.is_some() && kind != WorkItemType::Deliverable {
        return Err(ValidationError::DetailMismatch {
            kind,
            detail: "deliverableDetail",
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProgram {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub program_manager_user_id: Option<i64>,
    #[serde(deserialize_with = "dates::deserialize")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "dates::deserialize")]
    pub end_date: DateTime<Utc>,
}

impl NewProgram {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub program_manager_user_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub end_date: Option<DateTime<Utc>>,
}

impl ProgramPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_opt_text("name", self.name.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMilestone {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "dates::deserialize")]
    pub date: DateTime<Utc>,
    pub program_id: i64,
}

impl NewMilestone {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestonePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub program_id: Option<i64>,
}

impl MilestonePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_opt_text("name", self.name.as_ref())
    }
}

fn default_role() -> String {
    "Member".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub discipline_team_id: Option<i64>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("username", &self.username)?;
        require_text("name", &self.name)?;
        require_text("email", &self.email)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub phone_number: Option<Option<String>>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub profile_picture_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub discipline_team_id: Option<Option<i64>>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_opt_text("username", self.username.as_ref())?;
        require_opt_text("name", self.name.as_ref())?;
        require_opt_text("email", self.email.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub team_manager_user_id: Option<i64>,
}

impl NewTeam {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub team_manager_user_id: Option<Option<i64>>,
}

impl TeamPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_opt_text("name", self.name.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPartNumber {
    pub number: i64,
    pub part_name: String,
    #[serde(default)]
    pub level: i64,
    pub state: PartState,
    pub revision_level: String,
    #[serde(default)]
    pub assigned_user_id: Option<i64>,
    pub program_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl NewPartNumber {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("partName", &self.part_name)?;
        require_text("revisionLevel", &self.revision_level)?;
        require_range("level", self.level, 0, i64::from(u16::MAX))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartNumberPatch {
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub part_name: Option<String>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub state: Option<PartState>,
    #[serde(default)]
    pub revision_level: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_user_id: Option<Option<i64>>,
    /// `Some(None)` (an explicit `null`) detaches the part from its parent.
    #[serde(default, deserialize_with = "present")]
    pub parent_id: Option<Option<i64>>,
}

impl PartNumberPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_opt_text("partName", self.part_name.as_ref())?;
        require_opt_text("revisionLevel", self.revision_level.as_ref())?;
        match self.level {
            Some(level) => require_range("level", level, 0, i64::from(u16::MAX)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkItem {
    pub work_item_type: WorkItemType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub date_opened: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "dates::deserialize")]
    pub due_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub estimated_completion_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub actual_completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub percent_complete: u8,
    #[serde(default)]
    pub input_status: Option<String>,
    pub program_id: i64,
    #[serde(default)]
    pub due_by_milestone_id: Option<i64>,
    pub author_user_id: i64,
    #[serde(default)]
    pub assigned_user_id: Option<i64>,
    #[serde(default)]
    pub issue_detail: Option<IssueDetail>,
    #[serde(default)]
    pub deliverable_detail: Option<DeliverableDetail>,
    #[serde(default)]
    pub part_number_ids: Vec<i64>,
}

impl NewWorkItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_range("percentComplete", i64::from(self.percent_complete), 0, 100)?;
        check_details(
            self.work_item_type,
            self.issue_detail.as_ref(),
            self.deliverable_detail.as_ref(),
        )
    }
}

/// Partial edit of a work item. The item kind is fixed at creation.
///
/// Nullable fields are `Option<Option<_>>`: a missing key leaves the value
/// alone, an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "present")]
    pub tags: Option<Option<String>>,
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub date_opened: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize_opt")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize_present")]
    pub estimated_completion_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "dates::deserialize_present")]
    pub actual_completion_date: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub percent_complete: Option<u8>,
    #[serde(default, deserialize_with = "present")]
    pub input_status: Option<Option<String>>,
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub due_by_milestone_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_user_id: Option<Option<i64>>,
    #[serde(default)]
    pub issue_detail: Option<IssueDetail>,
    #[serde(default)]
    pub deliverable_detail: Option<DeliverableDetail>,
    /// `Some` replaces the whole link set; an empty list clears it.
    #[serde(default)]
    pub part_number_ids: Option<Vec<i64>>,
}

impl WorkItemPatch {
    pub fn validate_for(&self, kind: WorkItemType) -> Result<(), ValidationError> {
        require_opt_text("title", self.title.as_ref())?;
        if let Some(pct) = self.percent_complete {
            require_range("percentComplete", i64::from(pct), 0, 100)?;
        }
        check_details(
            kind,
            self.issue_detail.as_ref(),
            self.deliverable_detail.as_ref(),
        )
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: Status,
}
