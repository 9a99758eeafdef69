//! `pmtrack-service`: REST API over the program tracking store.
//!
//! JSON in and out, camelCase field names. Every handler borrows a pooled
//! SQLite connection through [`pmtrack_core::db::with_connection`] so the
//! async runtime never blocks on storage.

pub mod error;
mod handlers;
mod middleware;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch};
use pmtrack_core::config::ServiceConfig;
use pmtrack_core::db::DbPool;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub use error::ApiError;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: ServiceConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    use handlers::{
        dashboard, milestones, part_numbers, programs, search, teams, users, work_items,
    };

    Router::new()
        .route("/", get(handlers::home))
        .route("/healthz", get(handlers::healthz))
        .route("/workItems", get(work_items::list).post(work_items::create))
        .route("/workItems/burndown", get(work_items::burndown))
        .route("/workItems/user/:userId", get(work_items::by_user))
        .route(
            "/workItems/:id",
            get(work_items::get)
                .patch(work_items::update)
                .delete(work_items::delete),
        )
        .route("/workItems/:id/status", patch(work_items::update_status))
        .route("/programs", get(programs::list).post(programs::create))
        .route(
            "/programs/:id",
            get(programs::get)
                .patch(programs::update)
                .delete(programs::delete),
        )
        .route("/milestones", get(milestones::list).post(milestones::create))
        .route(
            "/milestones/:id",
            get(milestones::get)
                .patch(milestones::update)
                .delete(milestones::delete),
        )
        .route(
            "/partNumbers",
            get(part_numbers::list).post(part_numbers::create),
        )
        .route("/partNumbers/hierarchy", get(part_numbers::hierarchy))
        .route("/partNumbers/user/:userId", get(part_numbers::by_user))
        .route(
            "/partNumbers/:id",
            get(part_numbers::get)
                .patch(part_numbers::update)
                .delete(part_numbers::delete),
        )
        .route("/teams", get(teams::list).post(teams::create))
        .route(
            "/teams/:id",
            get(teams::get).patch(teams::update).delete(teams::delete),
        )
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:userId",
            get(users::get).patch(users::update).delete(users::delete),
        )
        .route("/search", get(search::search))
        .route("/dashboard", get(dashboard::dashboard))
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn(middleware::cors_middleware))
        .layer(axum::middleware::from_fn(
            middleware::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .with_state(state)
}

/// Serves until `shutdown` flips to `true`, then drains in-flight requests.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "pmtrack-service listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
}
