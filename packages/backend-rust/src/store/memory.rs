//! In-memory `DrillStore` used by tests and DB-less boots.
//!
//! A single mutex over the whole state keeps the compare-and-set operations
//! trivially atomic, which is exactly the contract the engine relies on.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{
    DrillProgress, DrillStore, MasteryRecord, SessionRecord, SessionStatus, SessionSummary,
    StoreError, TrailEntry,
};

#[derive(Default)]
struct Inner {
    mastery: HashMap<(String, i64), MasteryRecord>,
    drills: HashMap<(String, i64, i64), DrillProgress>,
    sessions: HashMap<String, SessionRecord>,
    trails: HashMap<String, Vec<TrailEntry>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrillStore for MemoryStore {
    async fn get_mastery(
        &self,
        user_id: &str,
        skill_id: i64,
    ) -> Result<Option<MasteryRecord>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.mastery.get(&(user_id.to_string(), skill_id)).cloned())
    }

    async fn upsert_mastery(&self, record: &MasteryRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner
            .mastery
            .insert((record.user_id.clone(), record.skill_id), record.clone());
        Ok(())
    }

    async fn drill_progress(
        &self,
        user_id: &str,
        module_id: i64,
    ) -> Result<Vec<DrillProgress>, StoreError> {
        let inner = self.inner.lock();
        let mut rows: Vec<DrillProgress> = inner
            .drills
            .values()
            .filter(|p| p.user_id == user_id && p.module_id == module_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.drill_number);
        Ok(rows)
    }

    async fn upsert_drill_progress(&self, progress: &DrillProgress) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.drills.insert(
            (
                progress.user_id.clone(),
                progress.module_id,
                progress.drill_number,
            ),
            progress.clone(),
        );
        Ok(())
    }

    async fn reset_drill_progress(
        &self,
        user_id: &str,
        module_id: i64,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock();
        let before = inner.drills.len();
        inner
            .drills
            .retain(|(user, module, _), _| !(user == user_id && *module == module_id));
        Ok((before - inner.drills.len()) as u64)
    }

    async fn insert_session(&self, session: &SessionRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.sessions.insert(session.id.clone(), session.clone());
        inner.trails.insert(session.id.clone(), Vec::new());
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.sessions.get(session_id).cloned())
    }

    async fn find_active_session(
        &self,
        user_id: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .sessions
            .values()
            .find(|s| s.user_id == user_id && s.status == SessionStatus::Active)
            .cloned())
    }

    async fn claim_position(&self, session_id: &str, expected: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        match inner.sessions.get_mut(session_id) {
            Some(session)
                if session.status == SessionStatus::Active
                    && session.current_position == expected =>
            {
                session.current_position += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_trail(&self, session_id: &str, entry: &TrailEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner
            .trails
            .entry(session_id.to_string())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn trail(&self, session_id: &str) -> Result<Vec<TrailEntry>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.trails.get(session_id).cloned().unwrap_or_default())
    }

    async fn seen_question_ids(&self, user_id: &str) -> Result<HashSet<String>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.status == SessionStatus::Completed)
            .flat_map(|s| s.planned.iter().map(|p| p.question_id.clone()))
            .collect())
    }

    async fn complete_session(
        &self,
        session_id: &str,
        summary: &SessionSummary,
        ended_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        match inner.sessions.get_mut(session_id) {
            Some(session) if session.status == SessionStatus::Active => {
                session.status = SessionStatus::Completed;
                session.ended_at = Some(ended_at);
                session.summary = Some(summary.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PlannedQuestion, SessionKind};

    fn session(id: &str, user: &str) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            user_id: user.to_string(),
            kind: SessionKind::Drill,
            module_id: Some(1),
            drill_number: Some(1),
            planned: vec![PlannedQuestion {
                question_id: "q1".to_string(),
                skill_id: 101,
                module_id: 1,
                difficulty: 1,
            }],
            current_position: 0,
            total_questions: 1,
            status: SessionStatus::Active,
            started_at: Utc::now(),
            ended_at: None,
            summary: None,
        }
    }

    fn summary(session_id: &str) -> SessionSummary {
        SessionSummary {
            session_id: session_id.to_string(),
            kind: SessionKind::Drill,
            total_questions: 1,
            questions_attempted: 1,
            questions_correct: 1,
            accuracy: 100.0,
            total_points: 10,
            duration_seconds: 5,
            confidence_metrics: crate::store::ConfidenceMetrics {
                avg_confidence: 90.0,
                high_count: 1,
                medium_count: 0,
                low_count: 0,
            },
            time_insights: mathdrill_algo::analyze_pacing(&[]),
            completed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_claim_position_is_single_winner() {
        let store = MemoryStore::new();
        store.insert_session(&session("s1", "u1")).await.unwrap();

        assert!(store.claim_position("s1", 0).await.unwrap());
        // The duplicate retry loses.
        assert!(!store.claim_position("s1", 0).await.unwrap());
        assert!(!store.claim_position("missing", 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_complete_session_only_once() {
        let store = MemoryStore::new();
        store.insert_session(&session("s1", "u1")).await.unwrap();

        assert!(store
            .complete_session("s1", &summary("s1"), Utc::now())
            .await
            .unwrap());
        assert!(!store
            .complete_session("s1", &summary("s1"), Utc::now())
            .await
            .unwrap());

        let stored = store.get_session("s1").await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert!(stored.summary.is_some());
    }

    #[tokio::test]
    async fn test_seen_question_ids_only_completed() {
        let store = MemoryStore::new();
        store.insert_session(&session("s1", "u1")).await.unwrap();
        assert!(store.seen_question_ids("u1").await.unwrap().is_empty());

        store
            .complete_session("s1", &summary("s1"), Utc::now())
            .await
            .unwrap();
        let seen = store.seen_question_ids("u1").await.unwrap();
        assert!(seen.contains("q1"));
        assert!(store.seen_question_ids("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_drill_progress_counts() {
        let store = MemoryStore::new();
        for drill in 1..=3 {
            store
                .upsert_drill_progress(&DrillProgress {
                    user_id: "u1".to_string(),
                    module_id: 1,
                    drill_number: drill,
                    accuracy: 80.0,
                    completed_at: Utc::now(),
                    session_id: format!("s{drill}"),
                })
                .await
                .unwrap();
        }
        assert_eq!(store.reset_drill_progress("u1", 1).await.unwrap(), 3);
        assert_eq!(store.reset_drill_progress("u1", 1).await.unwrap(), 0);
    }
}
