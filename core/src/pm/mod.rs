//! Program tracking domain: records, payloads and the computations the
//! dashboard views are built from.

pub mod burndown;
pub mod dates;
pub mod enums;
pub mod hierarchy;
pub mod inputs;
pub mod records;
pub mod summary;

pub use enums::{DeliverableType, IssueType, PartState, Priority, Status, WorkItemType};
pub use inputs::{
    MilestonePatch, NewMilestone, NewPartNumber, NewProgram, NewTeam, NewUser, NewWorkItem,
    PartNumberPatch, ProgramPatch, StatusUpdate, TeamPatch, UserPatch, ValidationError,
    WorkItemPatch,
};
pub use records::{
    DeliverableDetail, DisciplineTeam, IssueDetail, Milestone, PartNumber, Program,
    SearchResults, TeamSummary, User, UserDetail, WorkItem,
};
