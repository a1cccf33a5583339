//! Operational HTTP endpoints.
//!
//! - `/healthz`          : liveness
//! - `/metrics`          : text exposition
//! - `/v1/metrics`       : structured snapshot (JSON)
//! - `/v1/metrics/:name` : one series (JSON), 404 when unknown
//! - `/v1/stats`         : registry stats (JSON)

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use pulse_core::{exposition, ErrorCode};

use crate::app_state::AppState;
use crate::export;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = export::render_text(&state.registry());

    (StatusCode::OK, [(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body).into_response()
}

pub async fn snapshot(State(state): State<AppState>) -> Response {
    Json(export::snapshot(&state.registry())).into_response()
}

pub async fn metric(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.registry().get_metric(&name) {
        Some(series) => Json(series).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "code": ErrorCode::NotFound.as_str(),
                "msg": format!("unknown metric: {name}"),
            })),
        )
            .into_response(),
    }
}

pub async fn stats(State(state): State<AppState>) -> Response {
    Json(state.registry().stats()).into_response()
}
