use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use pmtrack_core::db::repo::teams;
use pmtrack_core::pm::{DisciplineTeam, NewTeam, TeamPatch, TeamSummary};

use super::{ApiResult, created, deleted, parse_id, run};
use crate::AppState;

/// Teams with the manager's username alongside the id.
pub(crate) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<TeamSummary>>> {
    Ok(Json(run(&state, |conn| teams::list(conn)).await?))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DisciplineTeam>> {
    let id = parse_id(&id, "team id")?;
    Ok(Json(run(&state, move |conn| teams::get(conn, id)).await?))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    body: Result<Json<NewTeam>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let team = run(&state, move |conn| teams::create(conn, &input)).await?;
    tracing::info!(team_id = team.id, "team created");
    Ok(created(team))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TeamPatch>, JsonRejection>,
) -> ApiResult<Json<DisciplineTeam>> {
    let id = parse_id(&id, "team id")?;
    let Json(patch) = body?;
    Ok(Json(
        run(&state, move |conn| teams::update(conn, id, &patch)).await?,
    ))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "team id")?;
    run(&state, move |conn| teams::delete(conn, id)).await?;
    tracing::info!(team_id = id, "team deleted");
    Ok(deleted("Team", id))
}
