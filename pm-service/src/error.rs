//! HTTP error mapping.
//!
//! Every failure leaves the service as `{"message": "..."}` with a status
//! that tells the client whether retrying with different input can help.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pmtrack_core::db::DbError;
use pmtrack_core::pm::burndown::BurndownError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_constraint_violation() {
            return ApiError::Conflict(err.to_string());
        }
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::Invalid(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<BurndownError> for ApiError {
    fn from(err: BurndownError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(message) => tracing::error!(%status, "{message}"),
            other => tracing::debug!(%status, "{other}"),
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_storage_errors_to_statuses() {
        let not_found: ApiError = DbError::NotFound {
            entity: "Program",
            id: 4,
        }
        .into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Program 4 not found");

        let invalid: ApiError = DbError::Invalid("title must not be empty".to_string()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let conflict: ApiError = DbError::Conflict("in use".to_string()).into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let pool: ApiError = DbError::Pool("exhausted".to_string()).into();
        assert_eq!(pool.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn sqlite_constraint_failure_is_a_conflict() {
        let conn = pmtrack_core::db::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t VALUES (1);")
            .unwrap();
        let err = conn
            .execute("INSERT INTO t (id) VALUES (1)", [])
            .map_err(DbError::from)
            .unwrap_err();
        assert_eq!(ApiError::from(err).status(), StatusCode::CONFLICT);
    }
}
