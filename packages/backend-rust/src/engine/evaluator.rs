//! Answer evaluator: grades one submission against the session's current
//! planned question and applies the resulting side effects in order.
//!
//! The position claim is a compare-and-set in the store, so two racing
//! submissions for the same slot (a duplicate network retry, say) resolve
//! to one winner; the loser gets `QuestionMismatch` and mutates nothing.

use chrono::Utc;
use mathdrill_algo::{confidence_score, AdaptationConfig};

use crate::catalog::{Catalog, Question, QuestionType};
use crate::engine::error::EngineError;
use crate::engine::mastery::{record_attempt, MasteryUpdate};
use crate::store::{DrillStore, PlannedQuestion, SessionStatus, TrailEntry};

/// Base points per difficulty level for a correct answer.
const POINTS_PER_LEVEL: i64 = 10;

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub session_id: String,
    pub entry: TrailEntry,
    pub mastery: MasteryUpdate,
    pub next_question: Option<PlannedQuestion>,
    pub questions_attempted: i64,
    pub questions_correct: i64,
    /// Percentage over the answers submitted so far.
    pub accuracy_so_far: f64,
    pub questions_remaining: i64,
}

pub async fn submit_answer(
    store: &dyn DrillStore,
    catalog: &Catalog,
    adaptation: &AdaptationConfig,
    session_id: &str,
    question_id: &str,
    user_answer: &str,
    time_spent_seconds: f64,
    hints_used: i64,
) -> Result<AnswerOutcome, EngineError> {
    let session = store
        .get_session(session_id)
        .await?
        .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;

    if session.status == SessionStatus::Completed {
        return Err(EngineError::SessionAlreadyCompleted);
    }

    let position = session.current_position;
    let Some(current) = session.current_question() else {
        // Plan exhausted; the client should end the session.
        return Err(EngineError::QuestionMismatch { expected: None });
    };
    if current.question_id != question_id {
        return Err(EngineError::QuestionMismatch {
            expected: Some(current.question_id.clone()),
        });
    }

    let question = catalog
        .question(question_id)
        .ok_or_else(|| EngineError::Invalid(format!("unknown question: {question_id}")))?;

    // Claim the slot before writing anything; a race-lost duplicate stops
    // here with session state untouched.
    if !store.claim_position(session_id, position).await? {
        return Err(EngineError::QuestionMismatch {
            expected: Some(current.question_id.clone()),
        });
    }

    let is_correct = grade(question, user_answer);
    let confidence = confidence_score(
        is_correct,
        time_spent_seconds,
        question.expected_time_seconds as f64,
    );
    let points = if is_correct {
        POINTS_PER_LEVEL * question.difficulty as i64
    } else {
        0
    };

    let entry = TrailEntry {
        position,
        question_id: question.id.clone(),
        skill_id: question.skill_id,
        difficulty: current.difficulty,
        user_answer: user_answer.to_string(),
        is_correct,
        time_spent_seconds,
        confidence,
        hints_used,
        points,
        answered_at: Utc::now(),
    };
    store.append_trail(session_id, &entry).await?;

    let mastery = record_attempt(store, &session.user_id, question.skill_id, is_correct, adaptation)
        .await?;

    let trail = store.trail(session_id).await?;
    let questions_attempted = trail.len() as i64;
    let questions_correct = trail.iter().filter(|e| e.is_correct).count() as i64;
    let accuracy_so_far = if questions_attempted > 0 {
        questions_correct as f64 / questions_attempted as f64 * 100.0
    } else {
        0.0
    };

    let next_index = usize::try_from(position + 1).unwrap_or(usize::MAX);
    let next_question = session.planned.get(next_index).cloned();
    let questions_remaining = session.total_questions - (position + 1);

    tracing::debug!(
        session_id,
        question_id,
        is_correct,
        confidence,
        points,
        "answer graded"
    );

    Ok(AnswerOutcome {
        session_id: session_id.to_string(),
        entry,
        mastery,
        next_question,
        questions_attempted,
        questions_correct,
        accuracy_so_far,
        questions_remaining,
    })
}

/// Type-aware correctness check.
///
/// MCQ answers are the option letter, compared case-insensitively; numeric
/// answers compare as exact numbers (falling back to trimmed string
/// equality when either side does not parse); text answers compare
/// case-insensitively after trimming.
pub fn grade(question: &Question, user_answer: &str) -> bool {
    let given = user_answer.trim();
    let expected = question.correct_answer.trim();

    match question.question_type {
        QuestionType::Mcq => given.eq_ignore_ascii_case(expected),
        QuestionType::Numeric => match (given.parse::<f64>(), expected.parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => given == expected,
        },
        QuestionType::Text => given.to_lowercase() == expected.to_lowercase(),
    }
}
