use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use pmtrack_core::db::repo::programs;
use pmtrack_core::pm::{NewProgram, Program, ProgramPatch};

use super::{ApiResult, created, deleted, parse_id, run};
use crate::AppState;

pub(crate) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Program>>> {
    Ok(Json(run(&state, |conn| programs::list(conn)).await?))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Program>> {
    let id = parse_id(&id, "program id")?;
    Ok(Json(run(&state, move |conn| programs::get(conn, id)).await?))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    body: Result<Json<NewProgram>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let program = run(&state, move |conn| programs::create(conn, &input)).await?;
    Ok(created(program))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ProgramPatch>, JsonRejection>,
) -> ApiResult<Json<Program>> {
    let id = parse_id(&id, "program id")?;
    let Json(patch) = body?;
    Ok(Json(
        run(&state, move |conn| programs::update(conn, id, &patch)).await?,
    ))
}

/// Refused with 409 while milestones, parts or work items still reference
/// the program.
pub(crate) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "program id")?;
    run(&state, move |conn| programs::delete(conn, id)).await?;
    Ok(deleted("Program", id))
}
