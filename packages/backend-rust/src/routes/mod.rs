mod catalog;
mod drills;
mod health;
mod mastery;
mod sessions;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api/sessions", sessions::router())
        .nest("/api/drills", drills::router())
        .nest("/api/modules", catalog::router())
        .nest("/api/mastery", mastery::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "route not found").into_response()
}
