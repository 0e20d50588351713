//! Post-session analytics and the end-session side effects.
//!
//! Ending is idempotent: the first caller computes and stores the
//! summary and applies the drill-progress side effect; every later call
//! returns the stored summary untouched.

use chrono::Utc;
use mathdrill_algo::{analyze_pacing, AnswerSample, ConfidenceBucket};

use crate::engine::error::EngineError;
use crate::store::{
    ConfidenceMetrics, DrillProgress, DrillStore, SessionKind, SessionRecord, SessionSummary,
    TrailEntry,
};

pub async fn end_session(
    store: &dyn DrillStore,
    session_id: &str,
    user_id: &str,
) -> Result<SessionSummary, EngineError> {
    let session = store
        .get_session(session_id)
        .await?
        .filter(|s| s.user_id == user_id)
        .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;

    if let Some(summary) = &session.summary {
        return Ok(summary.clone());
    }

    let trail = store.trail(session_id).await?;
    let summary = build_summary(&session, &trail);

    let newly_completed = store
        .complete_session(session_id, &summary, summary.completed_at)
        .await?;

    if !newly_completed {
        // Lost the race against a concurrent end: take the stored summary.
        let stored = store
            .get_session(session_id)
            .await?
            .and_then(|s| s.summary);
        return stored.ok_or(EngineError::SessionAlreadyCompleted);
    }

    if session.kind == SessionKind::Drill {
        if let (Some(module_id), Some(drill_number)) = (session.module_id, session.drill_number) {
            store
                .upsert_drill_progress(&DrillProgress {
                    user_id: session.user_id.clone(),
                    module_id,
                    drill_number,
                    accuracy: summary.accuracy,
                    completed_at: summary.completed_at,
                    session_id: session.id.clone(),
                })
                .await?;
            tracing::info!(
                session_id,
                module_id,
                drill_number,
                accuracy = summary.accuracy,
                "drill completed"
            );
        }
    }

    Ok(summary)
}

fn build_summary(session: &SessionRecord, trail: &[TrailEntry]) -> SessionSummary {
    let questions_attempted = trail.len() as i64;
    let questions_correct = trail.iter().filter(|e| e.is_correct).count() as i64;
    let accuracy = if questions_attempted > 0 {
        questions_correct as f64 / questions_attempted as f64 * 100.0
    } else {
        0.0
    };
    let total_points: i64 = trail.iter().map(|e| e.points).sum();

    // Duration ends at the last recorded answer; a session ended without
    // any answers measures to the end call itself.
    let completed_at = Utc::now();
    let end_instant = trail
        .last()
        .map(|e| e.answered_at)
        .unwrap_or(completed_at);
    let duration_seconds = (end_instant - session.started_at).num_seconds().max(0);

    let mut high_count = 0i64;
    let mut medium_count = 0i64;
    let mut low_count = 0i64;
    for entry in trail {
        match ConfidenceBucket::from_score(entry.confidence) {
            ConfidenceBucket::High => high_count += 1,
            ConfidenceBucket::Medium => medium_count += 1,
            ConfidenceBucket::Low => low_count += 1,
        }
    }
    let avg_confidence = if trail.is_empty() {
        0.0
    } else {
        trail.iter().map(|e| e.confidence as f64).sum::<f64>() / trail.len() as f64
    };

    let samples: Vec<AnswerSample> = trail
        .iter()
        .map(|e| AnswerSample {
            is_correct: e.is_correct,
            time_spent_seconds: e.time_spent_seconds,
            difficulty: e.difficulty,
        })
        .collect();

    SessionSummary {
        session_id: session.id.clone(),
        kind: session.kind,
        total_questions: session.total_questions,
        questions_attempted,
        questions_correct,
        accuracy,
        total_points,
        duration_seconds,
        confidence_metrics: ConfidenceMetrics {
            avg_confidence,
            high_count,
            medium_count,
            low_count,
        },
        time_insights: analyze_pacing(&samples),
        completed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathdrill_algo::AdaptationConfig;

    use crate::engine::evaluator::submit_answer;
    use crate::engine::planner::{start_drill, DRILL_SESSION_SIZE};
    use crate::seed::seed_catalog;
    use crate::store::MemoryStore;

    async fn run_drill(
        store: &MemoryStore,
        catalog: &crate::catalog::Catalog,
        user_id: &str,
        module_id: i64,
        drill_number: i64,
        correct_count: usize,
    ) -> String {
        let session = start_drill(store, catalog, user_id, module_id, drill_number)
            .await
            .unwrap();
        for i in 0..session.total_questions as usize {
            let current = store
                .get_session(&session.id)
                .await
                .unwrap()
                .unwrap()
                .current_question()
                .unwrap()
                .clone();
            let question = catalog.question(&current.question_id).unwrap();
            let answer = if i < correct_count {
                question.correct_answer.clone()
            } else {
                "definitely-wrong".to_string()
            };
            submit_answer(
                store,
                catalog,
                &AdaptationConfig::default(),
                &session.id,
                &current.question_id,
                &answer,
                4.0,
                0,
            )
            .await
            .unwrap();
        }
        session.id
    }

    #[tokio::test]
    async fn test_seven_of_ten_drill_scenario() {
        let store = MemoryStore::new();
        let catalog = seed_catalog();
        let session_id = run_drill(&store, &catalog, "u1", 1, 1, 7).await;

        let summary = end_session(&store, &session_id, "u1").await.unwrap();
        assert_eq!(summary.total_questions, DRILL_SESSION_SIZE as i64);
        assert_eq!(summary.questions_attempted, 10);
        assert_eq!(summary.questions_correct, 7);
        assert_eq!(summary.accuracy, 70.0);
        assert!(summary.total_points > 0);

        // Drill 1 is recorded complete; drill 2 opens up.
        let progress = store.drill_progress("u1", 1).await.unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].drill_number, 1);
        assert_eq!(progress[0].accuracy, 70.0);
        assert!(start_drill(&store, &catalog, "u1", 1, 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_end_session_is_idempotent() {
        let store = MemoryStore::new();
        let catalog = seed_catalog();
        let session_id = run_drill(&store, &catalog, "u1", 1, 1, 5).await;

        let first = end_session(&store, &session_id, "u1").await.unwrap();
        let second = end_session(&store, &session_id, "u1").await.unwrap();
        assert_eq!(first.completed_at, second.completed_at);
        assert_eq!(first.accuracy, second.accuracy);
        assert_eq!(first.total_points, second.total_points);

        // The drill-progress side effect ran once.
        let progress = store.drill_progress("u1", 1).await.unwrap();
        assert_eq!(progress.len(), 1);
    }

    #[tokio::test]
    async fn test_end_unknown_or_foreign_session() {
        let store = MemoryStore::new();
        let catalog = seed_catalog();
        let session_id = run_drill(&store, &catalog, "u1", 1, 1, 5).await;

        assert!(matches!(
            end_session(&store, "missing", "u1").await,
            Err(EngineError::SessionNotFound(_))
        ));
        // Another user cannot end someone else's session.
        assert!(matches!(
            end_session(&store, &session_id, "u2").await,
            Err(EngineError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_no_question_repeats_across_three_drills() {
        let store = MemoryStore::new();
        let catalog = seed_catalog();

        let mut all_planned = Vec::new();
        for drill in 1..=3 {
            let session_id = run_drill(&store, &catalog, "u1", 1, drill, 10).await;
            end_session(&store, &session_id, "u1").await.unwrap();
            let session = store.get_session(&session_id).await.unwrap().unwrap();
            all_planned.extend(session.planned.iter().map(|p| p.question_id.clone()));
        }

        let unique: std::collections::HashSet<&String> = all_planned.iter().collect();
        assert_eq!(
            unique.len(),
            all_planned.len(),
            "a question repeated across completed drills"
        );
    }

    #[tokio::test]
    async fn test_practice_session_leaves_drill_progress_alone() {
        let store = MemoryStore::new();
        let catalog = seed_catalog();
        let session = crate::engine::planner::start_practice(&store, &catalog, "u1", 5, &[1])
            .await
            .unwrap();
        end_session(&store, &session.id, "u1").await.unwrap();
        assert!(store.drill_progress("u1", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_counts_confidence_buckets() {
        let store = MemoryStore::new();
        let catalog = seed_catalog();
        let session_id = run_drill(&store, &catalog, "u1", 1, 1, 6).await;
        let summary = end_session(&store, &session_id, "u1").await.unwrap();

        let buckets = summary.confidence_metrics.high_count
            + summary.confidence_metrics.medium_count
            + summary.confidence_metrics.low_count;
        assert_eq!(buckets, summary.questions_attempted);
        assert!(summary.confidence_metrics.avg_confidence > 0.0);
    }
}
