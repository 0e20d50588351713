//! Adaptive drill engine: session planning, answer evaluation, mastery
//! adaptation, and post-session analytics.

pub mod analytics;
pub mod bank;
pub mod error;
pub mod evaluator;
pub mod mastery;
pub mod planner;

pub use analytics::end_session;
pub use error::EngineError;
pub use evaluator::{submit_answer, AnswerOutcome};
pub use mastery::{mastery_label, DifficultyAdjustment, MasteryUpdate};
pub use planner::{
    remaining_time_seconds, start_drill, start_practice, DRILL_SESSION_SIZE, MAX_PRACTICE_SIZE,
};
