//! Engine error taxonomy and its mapping onto HTTP responses.
//!
//! Every variant except `Store` is recoverable by the caller and surfaces
//! as a structured JSON error. Storage failures are the one infrastructure
//! condition and map to a generic 500.

use axum::http::StatusCode;
use thiserror::Error;

use crate::response::{json_error, AppError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("user already has an active session")]
    ActiveSessionExists { session_id: String },

    #[error("drill {requested} is locked; complete drill {required} first")]
    DrillLocked { requested: i64, required: i64 },

    #[error("submitted question is not the session's current question")]
    QuestionMismatch { expected: Option<String> },

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session is already completed")]
    SessionAlreadyCompleted,

    #[error("no eligible skills with servable questions")]
    NoEligibleSkills,

    #[error("module not found: {0}")]
    ModuleNotFound(i64),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::ActiveSessionExists { session_id } => json_error(
                StatusCode::CONFLICT,
                "ACTIVE_SESSION_EXISTS",
                err.to_string(),
            )
            .with_details(serde_json::json!({ "sessionId": session_id })),
            EngineError::DrillLocked { required, .. } => {
                json_error(StatusCode::CONFLICT, "DRILL_LOCKED", err.to_string())
                    .with_details(serde_json::json!({ "requiredDrill": required }))
            }
            EngineError::QuestionMismatch { expected } => {
                json_error(StatusCode::CONFLICT, "QUESTION_MISMATCH", err.to_string())
                    .with_details(serde_json::json!({ "expectedQuestionId": expected }))
            }
            EngineError::SessionNotFound(_) => {
                json_error(StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", err.to_string())
            }
            EngineError::SessionAlreadyCompleted => {
                json_error(StatusCode::CONFLICT, "SESSION_COMPLETED", err.to_string())
            }
            EngineError::NoEligibleSkills => json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_ELIGIBLE_SKILLS",
                err.to_string(),
            ),
            EngineError::ModuleNotFound(_) => {
                json_error(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            EngineError::Invalid(_) => AppError::validation(err.to_string()),
            EngineError::Store(inner) => {
                tracing::error!(error = %inner, "store failure");
                AppError::internal(err.to_string())
            }
        }
    }
}
