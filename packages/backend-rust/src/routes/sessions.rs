use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::catalog::Question;
use crate::engine::{self, mastery_label, AnswerOutcome};
use crate::response::AppError;
use crate::state::AppState;
use crate::store::{PlannedQuestion, SessionRecord, SessionSummary};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/practice", post(start_practice))
        .route("/drill", post(start_drill))
        .route("/:session_id/answers", post(submit_answer))
        .route("/:session_id/end", post(end_session))
}

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

const DEFAULT_PRACTICE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartPracticeRequest {
    user_id: String,
    session_size: Option<usize>,
    #[serde(default)]
    focus_modules: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartDrillRequest {
    user_id: String,
    module_id: i64,
    drill_number: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAnswerRequest {
    question_id: String,
    answer: String,
    time_spent_seconds: f64,
    #[serde(default)]
    hints_used: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndSessionRequest {
    user_id: String,
}

/// Question as presented to the client: no answer, no solution.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionView {
    id: String,
    module_id: i64,
    skill_id: i64,
    difficulty: u8,
    question_type: crate::catalog::QuestionType,
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,
    expected_time_seconds: i64,
}

impl QuestionView {
    fn from_question(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            module_id: question.module_id,
            skill_id: question.skill_id,
            difficulty: question.difficulty,
            question_type: question.question_type,
            text: question.text.clone(),
            options: question.options.clone(),
            expected_time_seconds: question.expected_time_seconds,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionStartedResponse {
    session_id: String,
    kind: crate::store::SessionKind,
    total_questions: i64,
    questions_remaining: i64,
    estimated_time_minutes: i64,
    first_question: Option<QuestionView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PerformanceView {
    mastery_label: &'static str,
    difficulty_adjustment: String,
    accuracy_so_far: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerFeedbackResponse {
    is_correct: bool,
    points_earned: i64,
    confidence: u8,
    correct_answer: String,
    solution_steps: Vec<String>,
    hints: Vec<String>,
    performance: PerformanceView,
    questions_attempted: i64,
    questions_correct: i64,
    questions_remaining: i64,
    next_question: Option<QuestionView>,
}

async fn start_practice(
    State(state): State<AppState>,
    Json(payload): Json<StartPracticeRequest>,
) -> Response {
    let size = payload.session_size.unwrap_or(DEFAULT_PRACTICE_SIZE);
    let result = engine::start_practice(
        state.store(),
        state.catalog(),
        &payload.user_id,
        size,
        &payload.focus_modules,
    )
    .await;

    match result {
        Ok(session) => session_started(&state, &session),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn start_drill(
    State(state): State<AppState>,
    Json(payload): Json<StartDrillRequest>,
) -> Response {
    let result = engine::start_drill(
        state.store(),
        state.catalog(),
        &payload.user_id,
        payload.module_id,
        payload.drill_number,
    )
    .await;

    match result {
        Ok(session) => session_started(&state, &session),
        Err(err) => AppError::from(err).into_response(),
    }
}

fn session_started(state: &AppState, session: &SessionRecord) -> Response {
    let remaining_seconds =
        engine::remaining_time_seconds(state.catalog(), &session.planned, 0);
    let response = SessionStartedResponse {
        session_id: session.id.clone(),
        kind: session.kind,
        total_questions: session.total_questions,
        questions_remaining: session.total_questions,
        estimated_time_minutes: minutes_ceil(remaining_seconds),
        first_question: question_view(state, session.planned.first()),
    };

    Json(SuccessResponse {
        success: true,
        data: response,
    })
    .into_response()
}

async fn submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Response {
    let result = engine::submit_answer(
        state.store(),
        state.catalog(),
        state.adaptation(),
        &session_id,
        &payload.question_id,
        &payload.answer,
        payload.time_spent_seconds,
        payload.hints_used,
    )
    .await;

    match result {
        Ok(outcome) => answer_feedback(&state, outcome),
        Err(err) => AppError::from(err).into_response(),
    }
}

fn answer_feedback(state: &AppState, outcome: AnswerOutcome) -> Response {
    // The graded question is in the catalog by construction.
    let (correct_answer, solution_steps, hints) =
        match state.catalog().question(&outcome.entry.question_id) {
            Some(q) => (
                q.correct_answer.clone(),
                q.solution_steps.clone(),
                q.hints.clone(),
            ),
            None => (String::new(), Vec::new(), Vec::new()),
        };

    let response = AnswerFeedbackResponse {
        is_correct: outcome.entry.is_correct,
        points_earned: outcome.entry.points,
        confidence: outcome.entry.confidence,
        correct_answer,
        solution_steps,
        hints,
        performance: PerformanceView {
            mastery_label: mastery_label(&outcome.mastery.record),
            difficulty_adjustment: outcome.mastery.adjustment.describe(),
            accuracy_so_far: outcome.accuracy_so_far,
        },
        questions_attempted: outcome.questions_attempted,
        questions_correct: outcome.questions_correct,
        questions_remaining: outcome.questions_remaining,
        next_question: question_view(state, outcome.next_question.as_ref()),
    };

    Json(SuccessResponse {
        success: true,
        data: response,
    })
    .into_response()
}

async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<EndSessionRequest>,
) -> Response {
    match engine::end_session(state.store(), &session_id, &payload.user_id).await {
        Ok(summary) => Json(SuccessResponse::<SessionSummary> {
            success: true,
            data: summary,
        })
        .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

fn question_view(state: &AppState, planned: Option<&PlannedQuestion>) -> Option<QuestionView> {
    planned
        .and_then(|p| state.catalog().question(&p.question_id))
        .map(QuestionView::from_question)
}

fn minutes_ceil(seconds: i64) -> i64 {
    (seconds + 59) / 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_ceil() {
        assert_eq!(minutes_ceil(0), 0);
        assert_eq!(minutes_ceil(59), 1);
        assert_eq!(minutes_ceil(60), 1);
        assert_eq!(minutes_ceil(61), 2);
    }
}
