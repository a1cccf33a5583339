//! Axum router wiring for the exposition and introspection endpoints.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .route("/v1/metrics", get(ops::snapshot))
        .route("/v1/metrics/:name", get(ops::metric))
        .route("/v1/stats", get(ops::stats))
        .with_state(state)
}
