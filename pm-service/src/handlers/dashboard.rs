use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use chrono::Utc;
use pmtrack_core::db::repo::work_items::WorkItemFilter;
use pmtrack_core::db::repo::{milestones, teams, users, work_items};
use pmtrack_core::pm::summary::{self, DashboardInput, DashboardSummary};
use serde::Deserialize;

use super::{ApiResult, run};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DashboardQuery {
    program_id: Option<i64>,
    #[serde(default)]
    open_only: bool,
}

pub(crate) async fn dashboard(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> ApiResult<Json<DashboardSummary>> {
    let Query(DashboardQuery {
        program_id,
        open_only,
    }) = query?;

    let (items, users, teams, milestones) = run(&state, move |conn| {
        let filter = WorkItemFilter {
            program_id,
            part_number_id: None,
        };
        Ok((
            work_items::list(conn, filter)?,
            users::list(conn)?,
            teams::list_plain(conn)?,
            milestones::list(conn, program_id)?,
        ))
    })
    .await?;

    Ok(Json(summary::summarize(&DashboardInput {
        items: &items,
        users: &users,
        teams: &teams,
        milestones: &milestones,
        today: Utc::now().date_naive(),
        open_only,
    })))
}
