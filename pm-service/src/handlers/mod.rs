//! Route handlers, one module per resource.
//!
//! Handlers are thin: parse the request, run one storage closure on the
//! blocking pool, and serialize the result.

pub(crate) mod dashboard;
pub(crate) mod milestones;
pub(crate) mod part_numbers;
pub(crate) mod programs;
pub(crate) mod search;
pub(crate) mod teams;
pub(crate) mod users;
pub(crate) mod work_items;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use pmtrack_core::db::{self, Connection, SCHEMA_VERSION, with_connection};
use serde::Serialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::error::ApiError;

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Runs `f` with a pooled connection and maps storage errors to HTTP ones.
pub(crate) async fn run<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&mut Connection) -> db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(with_connection(&state.pool, f).await?)
}

/// Path ids arrive as text so a malformed one can be reported as 400.
pub(crate) fn parse_id(raw: &str, what: &str) -> ApiResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {what}: {raw:?}")))
}

pub(crate) fn created<T: Serialize>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(value))
}

pub(crate) fn deleted(what: &str, id: i64) -> Json<Value> {
    Json(json!({ "message": format!("{what} {id} deleted successfully.") }))
}

pub(crate) async fn home() -> &'static str {
    "This is home route"
}

pub(crate) async fn healthz(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let version = run(&state, |conn| db::schema_version(conn)).await?;
    Ok(Json(json!({
        "status": "ok",
        "schemaVersion": version,
        "expectedSchemaVersion": SCHEMA_VERSION,
    })))
}

pub(crate) async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found" })),
    )
}
