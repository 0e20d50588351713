use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/info", get(info))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: &'static str,
    uptime: u64,
    timestamp: String,
}

async fn root() -> Response {
    Json(HealthResponse {
        status: "ok",
        timestamp: now_iso(),
    })
    .into_response()
}

async fn info(State(state): State<AppState>) -> Response {
    Json(HealthInfoResponse {
        service: "mathdrill-backend",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.uptime_seconds(),
        timestamp: now_iso(),
    })
    .into_response()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
