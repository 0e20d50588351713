use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{mastery_label, EngineError};
use crate::response::AppError;
use crate::state::AppState;
use crate::store::MasteryRecord;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(mastery_snapshot))
}

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasteryQuery {
    user_id: String,
    /// Restrict to one skill; omitted means every skill in the catalog.
    skill_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MasteryView {
    skill_id: i64,
    current_difficulty: u8,
    rolling_accuracy: Option<f64>,
    total_attempts: i64,
    correct_attempts: i64,
    label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

fn view(record: &MasteryRecord, attempted: bool) -> MasteryView {
    MasteryView {
        skill_id: record.skill_id,
        current_difficulty: record.current_difficulty,
        rolling_accuracy: record.rolling_accuracy(),
        total_attempts: record.total_attempts,
        correct_attempts: record.correct_attempts,
        label: mastery_label(record),
        updated_at: attempted.then_some(record.updated_at),
    }
}

async fn mastery_snapshot(
    State(state): State<AppState>,
    Query(query): Query<MasteryQuery>,
) -> Response {
    let skill_ids: Vec<i64> = match query.skill_id {
        Some(skill_id) => vec![skill_id],
        None => state
            .catalog()
            .modules()
            .flat_map(|m| m.skill_ids.iter().copied())
            .collect(),
    };

    let mut records = Vec::with_capacity(skill_ids.len());
    for skill_id in skill_ids {
        match state.store().get_mastery(&query.user_id, skill_id).await {
            Ok(Some(record)) => records.push(view(&record, true)),
            Ok(None) => records.push(view(
                &MasteryRecord::new_default(&query.user_id, skill_id),
                false,
            )),
            Err(err) => return AppError::from(EngineError::from(err)).into_response(),
        }
    }

    Json(SuccessResponse {
        success: true,
        data: records,
    })
    .into_response()
}
