use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use pmtrack_core::db::repo::search;
use pmtrack_core::pm::SearchResults;
use serde::Deserialize;

use super::{ApiResult, run};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    query: String,
}

pub(crate) async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<SearchResults>> {
    let Query(SearchQuery { query }) = query?;
    Ok(Json(
        run(&state, move |conn| search::search(conn, &query)).await?,
    ))
}
