use std::collections::HashSet;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use pmtrack_core::db::repo::{part_numbers, work_items};
use pmtrack_core::pm::hierarchy::{HierarchyView, PartTree};
use pmtrack_core::pm::{NewPartNumber, PartNumber, PartNumberPatch};
use serde::Deserialize;

use super::{ApiResult, created, deleted, parse_id, run};
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    program_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HierarchyQuery {
    program_id: Option<i64>,
    /// Comma-separated part ids the client has expanded.
    #[serde(default)]
    expanded: Option<String>,
}

fn parse_expanded(raw: Option<&str>) -> ApiResult<HashSet<i64>> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| ApiError::BadRequest(format!("invalid expanded id: {s:?}")))
        })
        .collect()
}

pub(crate) async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<PartNumber>>> {
    let Query(ListQuery { program_id }) = query?;
    Ok(Json(
        run(&state, move |conn| part_numbers::list(conn, program_id)).await?,
    ))
}

/// The part forest with work-item rollups per node.
pub(crate) async fn hierarchy(
    State(state): State<AppState>,
    query: Result<Query<HierarchyQuery>, QueryRejection>,
) -> ApiResult<Json<HierarchyView>> {
    let Query(query) = query?;
    let expanded = parse_expanded(query.expanded.as_deref())?;
    let program_id = query.program_id;

    let (parts, links) = run(&state, move |conn| {
        Ok((
            part_numbers::list(conn, program_id)?,
            work_items::part_links(conn, program_id)?,
        ))
    })
    .await?;

    let tree = PartTree::build(parts, program_id, &links);
    Ok(Json(tree.view(&expanded)))
}

pub(crate) async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<PartNumber>>> {
    let user_id = parse_id(&user_id, "userId")?;
    Ok(Json(
        run(&state, move |conn| part_numbers::list_by_user(conn, user_id)).await?,
    ))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PartNumber>> {
    let id = parse_id(&id, "part number id")?;
    Ok(Json(run(&state, move |conn| part_numbers::get(conn, id)).await?))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    body: Result<Json<NewPartNumber>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(input) = body?;
    let part = run(&state, move |conn| part_numbers::create(conn, &input)).await?;
    Ok(created(part))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<PartNumberPatch>, JsonRejection>,
) -> ApiResult<Json<PartNumber>> {
    let id = parse_id(&id, "part number id")?;
    let Json(patch) = body?;
    Ok(Json(
        run(&state, move |conn| part_numbers::update(conn, id, &patch)).await?,
    ))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "part number id")?;
    run(&state, move |conn| part_numbers::delete(conn, id)).await?;
    Ok(deleted("Part number", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn expanded_ids_are_comma_separated() {
        let ids = parse_expanded(Some("3, 1,,7")).unwrap();
        assert_eq!(ids, HashSet::from([1, 3, 7]));
        assert!(parse_expanded(None).unwrap().is_empty());
        assert!(parse_expanded(Some("1,x")).is_err());
    }
}
