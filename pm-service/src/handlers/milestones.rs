use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use pmtrack_core::db::repo::milestones;
use pmtrack_core::pm::{Milestone, MilestonePatch, NewMilestone};
use serde::Deserialize;

use super::{ApiResult, created, deleted, parse_id, run};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    program_id: Option<i64>,
}

pub(crate) async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Milestone>>> {
    let Query(ListQuery { program_id }) = query?;
    Ok(Json(
        run(&state, move |conn| milestones::list(conn, program_id)).await?,
    ))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Milestone>> {
    let id = parse_id(&id, "milestone id")?;
    Ok(Json(run(&state, move |conn| milestones::get(conn, id)).await?))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    body: Result<Json<NewMilestone>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let milestone = run(&state, move |conn| milestones::create(conn, &input)).await?;
    Ok(created(milestone))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<MilestonePatch>, JsonRejection>,
) -> ApiResult<Json<Milestone>> {
    let id = parse_id(&id, "milestone id")?;
    let Json(patch) = body?;
    Ok(Json(
        run(&state, move |conn| milestones::update(conn, id, &patch)).await?,
    ))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "milestone id")?;
    run(&state, move |conn| milestones::delete(conn, id)).await?;
    Ok(deleted("Milestone", id))
}
