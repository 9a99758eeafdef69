use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use pmtrack_core::db::repo::work_items::{self, WorkItemFilter};
use pmtrack_core::pm::burndown::{self, BurndownQuery, BurndownSeries};
use pmtrack_core::pm::{NewWorkItem, StatusUpdate, WorkItem, WorkItemPatch};
use serde::Deserialize;

use super::{ApiResult, created, deleted, parse_id, run};
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    program_id: Option<i64>,
    part_number_id: Option<i64>,
}

pub(crate) async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<WorkItem>>> {
    let Query(query) = query?;
    let filter = WorkItemFilter {
        program_id: query.program_id,
        part_number_id: query.part_number_id,
    };
    Ok(Json(run(&state, move |conn| work_items::list(conn, filter)).await?))
}

pub(crate) async fn burndown(
    State(state): State<AppState>,
    query: Result<Query<BurndownQuery>, QueryRejection>,
) -> ApiResult<Json<BurndownSeries>> {
    let Query(query) = query?;
    let window = query.window().map_err(ApiError::BadRequest)?;
    let filter = WorkItemFilter {
        program_id: query.program_id,
        part_number_id: query.part_number_id,
    };

    let items = run(&state, move |conn| work_items::list(conn, filter)).await?;
    let items: Vec<WorkItem> = items.into_iter().filter(|i| query.matches(i)).collect();
    let series = burndown::for_work_items(&items, window)?;
    tracing::debug!(items = items.len(), days = series.len(), "burndown computed");
    Ok(Json(series))
}

pub(crate) async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<WorkItem>>> {
    let user_id = parse_id(&user_id, "userId")?;
    Ok(Json(
        run(&state, move |conn| work_items::list_by_user(conn, user_id)).await?,
    ))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WorkItem>> {
    let id = parse_id(&id, "work item id")?;
    Ok(Json(run(&state, move |conn| work_items::get(conn, id)).await?))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    body: Result<Json<NewWorkItem>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let item = run(&state, move |conn| work_items::create(conn, &input)).await?;
    Ok(created(item))
}

pub(crate) async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<WorkItem>> {
    let id = parse_id(&id, "work item id")?;
    let Json(StatusUpdate { status }) = body?;
    Ok(Json(
        run(&state, move |conn| work_items::update_status(conn, id, status)).await?,
    ))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<WorkItemPatch>, JsonRejection>,
) -> ApiResult<Json<WorkItem>> {
    let id = parse_id(&id, "work item id")?;
    let Json(patch) = body?;
    Ok(Json(
        run(&state, move |conn| work_items::update(conn, id, &patch)).await?,
    ))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "work item id")?;
    run(&state, move |conn| work_items::delete(conn, id)).await?;
    Ok(deleted("Work item", id))
}
