use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;
use crate::response::AppError;
use crate::state::AppState;
use crate::store::SessionKind;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:module_id/status", get(drill_status))
        .route("/:module_id/reset", post(reset_progress))
}

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery {
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetRequest {
    user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum DrillState {
    Locked,
    Available,
    InProgress,
    Completed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DrillStatusEntry {
    drill_number: i64,
    state: DrillState,
    #[serde(skip_serializing_if = "Option::is_none")]
    accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DrillStatusResponse {
    module_id: i64,
    drills: Vec<DrillStatusEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetResponse {
    module_id: i64,
    drills_cleared: u64,
}

/// Lock state is derived, not stored: a drill is completed when its
/// progress row exists, in progress when an active session points at it,
/// available when the previous drill is complete, locked otherwise.
async fn drill_status(
    State(state): State<AppState>,
    Path(module_id): Path<i64>,
    Query(query): Query<UserQuery>,
) -> Response {
    let Some(module) = state.catalog().module(module_id) else {
        return AppError::from(EngineError::ModuleNotFound(module_id)).into_response();
    };

    let progress = match state.store().drill_progress(&query.user_id, module_id).await {
        Ok(rows) => rows,
        Err(err) => return AppError::from(EngineError::from(err)).into_response(),
    };
    let active = match state.store().find_active_session(&query.user_id).await {
        Ok(session) => session,
        Err(err) => return AppError::from(EngineError::from(err)).into_response(),
    };
    let in_progress_drill = active
        .filter(|s| s.kind == SessionKind::Drill && s.module_id == Some(module_id))
        .and_then(|s| s.drill_number);

    let mut drills = Vec::with_capacity(module.drill_count as usize);
    for drill_number in 1..=module.drill_count {
        let completed = progress.iter().find(|p| p.drill_number == drill_number);
        let previous_done =
            drill_number == 1 || progress.iter().any(|p| p.drill_number == drill_number - 1);

        let drill_state = if completed.is_some() {
            DrillState::Completed
        } else if in_progress_drill == Some(drill_number) {
            DrillState::InProgress
        } else if previous_done {
            DrillState::Available
        } else {
            DrillState::Locked
        };

        drills.push(DrillStatusEntry {
            drill_number,
            state: drill_state,
            accuracy: completed.map(|p| p.accuracy),
            completed_at: completed.map(|p| p.completed_at),
        });
    }

    Json(SuccessResponse {
        success: true,
        data: DrillStatusResponse { module_id, drills },
    })
    .into_response()
}

async fn reset_progress(
    State(state): State<AppState>,
    Path(module_id): Path<i64>,
    Json(payload): Json<ResetRequest>,
) -> Response {
    if state.catalog().module(module_id).is_none() {
        return AppError::from(EngineError::ModuleNotFound(module_id)).into_response();
    }

    match state
        .store()
        .reset_drill_progress(&payload.user_id, module_id)
        .await
    {
        Ok(cleared) => {
            tracing::info!(
                user_id = %payload.user_id,
                module_id,
                cleared,
                "drill progress reset"
            );
            Json(SuccessResponse {
                success: true,
                data: ResetResponse {
                    module_id,
                    drills_cleared: cleared,
                },
            })
            .into_response()
        }
        Err(err) => AppError::from(EngineError::from(err)).into_response(),
    }
}
