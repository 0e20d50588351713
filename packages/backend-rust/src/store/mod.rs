//! Persistent state owned by the drill engine: mastery records, drill
//! progress, sessions, and answer trails.
//!
//! `DrillStore` is the single seam between the engine and storage. The
//! Postgres implementation backs production; the in-memory implementation
//! backs tests and DB-less boots. Both must honor the same atomicity
//! contract for `claim_position` and `complete_session`: exactly one of two
//! racing callers wins.

mod memory;
mod postgres;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mathdrill_algo::{AttemptWindow, PacingReport};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sql error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Practice,
    Drill,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Practice => "practice",
            SessionKind::Drill => "drill",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// One slot of a session's committed plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedQuestion {
    pub question_id: String,
    pub skill_id: i64,
    pub module_id: i64,
    pub difficulty: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub kind: SessionKind,
    /// Module focus; None for unfocused practice across modules.
    pub module_id: Option<i64>,
    pub drill_number: Option<i64>,
    pub planned: Vec<PlannedQuestion>,
    pub current_position: i64,
    pub total_questions: i64,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub summary: Option<SessionSummary>,
}

impl SessionRecord {
    /// The planned question at the session's current position, if any
    /// remain.
    pub fn current_question(&self) -> Option<&PlannedQuestion> {
        usize::try_from(self.current_position)
            .ok()
            .and_then(|idx| self.planned.get(idx))
    }
}

/// Append-only row per submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailEntry {
    pub position: i64,
    pub question_id: String,
    pub skill_id: i64,
    pub difficulty: u8,
    pub user_answer: String,
    pub is_correct: bool,
    pub time_spent_seconds: f64,
    pub confidence: u8,
    pub hints_used: i64,
    pub points: i64,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub user_id: String,
    pub skill_id: i64,
    pub current_difficulty: u8,
    pub window: AttemptWindow,
    pub total_attempts: i64,
    pub correct_attempts: i64,
    pub updated_at: DateTime<Utc>,
}

impl MasteryRecord {
    /// Lazy default: difficulty 1, no history yet.
    pub fn new_default(user_id: &str, skill_id: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            skill_id,
            current_difficulty: mathdrill_algo::MIN_DIFFICULTY,
            window: AttemptWindow::default(),
            total_attempts: 0,
            correct_attempts: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn rolling_accuracy(&self) -> Option<f64> {
        self.window.accuracy()
    }
}

/// Completed-drill row; availability and lock state are derived, only
/// completions are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillProgress {
    pub user_id: String,
    pub module_id: i64,
    pub drill_number: i64,
    pub accuracy: f64,
    pub completed_at: DateTime<Utc>,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceMetrics {
    pub avg_confidence: f64,
    pub high_count: i64,
    pub medium_count: i64,
    pub low_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub kind: SessionKind,
    pub total_questions: i64,
    pub questions_attempted: i64,
    pub questions_correct: i64,
    /// Percentage in [0, 100].
    pub accuracy: f64,
    pub total_points: i64,
    pub duration_seconds: i64,
    pub confidence_metrics: ConfidenceMetrics,
    pub time_insights: PacingReport,
    pub completed_at: DateTime<Utc>,
}

#[async_trait]
pub trait DrillStore: Send + Sync {
    async fn get_mastery(
        &self,
        user_id: &str,
        skill_id: i64,
    ) -> Result<Option<MasteryRecord>, StoreError>;

    async fn upsert_mastery(&self, record: &MasteryRecord) -> Result<(), StoreError>;

    async fn drill_progress(
        &self,
        user_id: &str,
        module_id: i64,
    ) -> Result<Vec<DrillProgress>, StoreError>;

    async fn upsert_drill_progress(&self, progress: &DrillProgress) -> Result<(), StoreError>;

    /// Clears all drill progress for the module; returns deleted row count.
    async fn reset_drill_progress(&self, user_id: &str, module_id: i64)
        -> Result<u64, StoreError>;

    async fn insert_session(&self, session: &SessionRecord) -> Result<(), StoreError>;

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    async fn find_active_session(
        &self,
        user_id: &str,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Atomically advance `current_position` from `expected` to
    /// `expected + 1` on an active session. Returns false when another
    /// submission already claimed the slot (or the session is not active).
    async fn claim_position(&self, session_id: &str, expected: i64) -> Result<bool, StoreError>;

    async fn append_trail(&self, session_id: &str, entry: &TrailEntry) -> Result<(), StoreError>;

    async fn trail(&self, session_id: &str) -> Result<Vec<TrailEntry>, StoreError>;

    /// Every question id planned in any of the user's *completed* sessions.
    /// Drives repetition prevention at planning time.
    async fn seen_question_ids(&self, user_id: &str) -> Result<HashSet<String>, StoreError>;

    /// Atomically flip the session to completed and attach the summary.
    /// Returns false when the session was already completed, in which case
    /// no state changed (idempotent end).
    async fn complete_session(
        &self,
        session_id: &str,
        summary: &SessionSummary,
        ended_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Pick the store implementation: Postgres when a database url is
/// configured, the in-memory store otherwise.
pub async fn connect(database_url: Option<&str>) -> Arc<dyn DrillStore> {
    match database_url {
        Some(url) => match PgStore::connect(url).await {
            Ok(store) => {
                tracing::info!("connected to postgres store");
                return Arc::new(store);
            }
            Err(err) => {
                tracing::warn!(error = %err, "postgres store unavailable, using memory store");
            }
        },
        None => {
            tracing::info!("no database url configured, using memory store");
        }
    }
    Arc::new(MemoryStore::new())
}
