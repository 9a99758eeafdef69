use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use pmtrack_core::db::repo::users;
use pmtrack_core::pm::{NewUser, User, UserDetail, UserPatch};

use super::{ApiResult, created, deleted, parse_id, run};
use crate::AppState;

pub(crate) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(run(&state, |conn| users::list(conn)).await?))
}

/// The user with team, authored and assigned work items, and parts.
pub(crate) async fn get(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserDetail>> {
    let user_id = parse_id(&user_id, "userId")?;
    Ok(Json(
        run(&state, move |conn| users::get_detail(conn, user_id)).await?,
    ))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let user = run(&state, move |conn| users::create(conn, &input)).await?;
    Ok(created(user))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let user_id = parse_id(&user_id, "userId")?;
    let Json(patch) = body?;
    Ok(Json(
        run(&state, move |conn| users::update(conn, user_id, &patch)).await?,
    ))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user_id = parse_id(&user_id, "userId")?;
    run(&state, move |conn| users::delete(conn, user_id)).await?;
    Ok(deleted("User", user_id))
}
