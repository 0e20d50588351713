//! Mastery tracker: per-user per-skill rolling accuracy and difficulty.

use chrono::Utc;
use mathdrill_algo::{next_difficulty, AdaptationConfig};
use serde::Serialize;

use crate::store::{DrillStore, MasteryRecord, StoreError};

/// How the difficulty level moved after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "level")]
pub enum DifficultyAdjustment {
    Increased(u8),
    Decreased(u8),
    Unchanged,
}

impl DifficultyAdjustment {
    pub fn describe(&self) -> String {
        match self {
            DifficultyAdjustment::Increased(level) => format!("difficulty increased to {level}"),
            DifficultyAdjustment::Decreased(level) => format!("difficulty decreased to {level}"),
            DifficultyAdjustment::Unchanged => "difficulty unchanged".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MasteryUpdate {
    pub record: MasteryRecord,
    pub previous_difficulty: u8,
    pub adjustment: DifficultyAdjustment,
}

/// Current snapshot, creating the lazy default when the user has never
/// attempted the skill.
pub async fn get_mastery(
    store: &dyn DrillStore,
    user_id: &str,
    skill_id: i64,
) -> Result<MasteryRecord, StoreError> {
    Ok(store
        .get_mastery(user_id, skill_id)
        .await?
        .unwrap_or_else(|| MasteryRecord::new_default(user_id, skill_id)))
}

/// Record one graded attempt: push into the rolling window, recompute
/// accuracy, step the difficulty, and persist.
pub async fn record_attempt(
    store: &dyn DrillStore,
    user_id: &str,
    skill_id: i64,
    is_correct: bool,
    config: &AdaptationConfig,
) -> Result<MasteryUpdate, StoreError> {
    let mut record = get_mastery(store, user_id, skill_id).await?;
    let previous_difficulty = record.current_difficulty;

    record.window.push(is_correct);
    record.total_attempts += 1;
    if is_correct {
        record.correct_attempts += 1;
    }

    let accuracy = record.rolling_accuracy().unwrap_or(0.0);
    record.current_difficulty = next_difficulty(
        previous_difficulty,
        accuracy,
        record.window.len(),
        config,
    );
    record.updated_at = Utc::now();

    store.upsert_mastery(&record).await?;

    let adjustment = match record.current_difficulty.cmp(&previous_difficulty) {
        std::cmp::Ordering::Greater => DifficultyAdjustment::Increased(record.current_difficulty),
        std::cmp::Ordering::Less => DifficultyAdjustment::Decreased(record.current_difficulty),
        std::cmp::Ordering::Equal => DifficultyAdjustment::Unchanged,
    };

    Ok(MasteryUpdate {
        record,
        previous_difficulty,
        adjustment,
    })
}

/// Coarse label shown to the user alongside feedback.
pub fn mastery_label(record: &MasteryRecord) -> &'static str {
    match record.rolling_accuracy() {
        None => "new",
        Some(a) if a < 0.4 => "struggling",
        Some(a) if a < 0.7 => "developing",
        Some(a) if a < 0.9 => "proficient",
        Some(_) => "mastered",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_default_record_for_fresh_skill() {
        let store = MemoryStore::new();
        let record = get_mastery(&store, "u1", 101).await.unwrap();
        assert_eq!(record.current_difficulty, 1);
        assert_eq!(record.total_attempts, 0);
        assert_eq!(record.rolling_accuracy(), None);
        assert_eq!(mastery_label(&record), "new");
    }

    #[tokio::test]
    async fn test_streak_of_correct_raises_difficulty() {
        let store = MemoryStore::new();
        let config = AdaptationConfig::default();

        let mut last = None;
        for _ in 0..3 {
            last = Some(
                record_attempt(&store, "u1", 101, true, &config)
                    .await
                    .unwrap(),
            );
        }
        let update = last.unwrap();
        // Third perfect answer reaches min_samples and steps 1 -> 2.
        assert_eq!(update.record.current_difficulty, 2);
        assert_eq!(update.adjustment, DifficultyAdjustment::Increased(2));
        assert_eq!(update.record.total_attempts, 3);
        assert_eq!(update.record.correct_attempts, 3);
    }

    #[tokio::test]
    async fn test_miss_at_floor_stays_at_floor() {
        let store = MemoryStore::new();
        let config = AdaptationConfig::default();
        let update = record_attempt(&store, "u1", 101, false, &config)
            .await
            .unwrap();
        assert_eq!(update.record.current_difficulty, 1);
        assert_eq!(update.adjustment, DifficultyAdjustment::Unchanged);
    }

    #[tokio::test]
    async fn test_update_is_persisted() {
        let store = MemoryStore::new();
        let config = AdaptationConfig::default();
        record_attempt(&store, "u1", 101, true, &config)
            .await
            .unwrap();

        let reloaded = get_mastery(&store, "u1", 101).await.unwrap();
        assert_eq!(reloaded.total_attempts, 1);
        assert_eq!(reloaded.rolling_accuracy(), Some(1.0));
    }

    #[test]
    fn test_labels() {
        let mut record = MasteryRecord::new_default("u1", 101);
        record.window.push(false);
        assert_eq!(mastery_label(&record), "struggling");
        for _ in 0..9 {
            record.window.push(true);
        }
        assert_eq!(mastery_label(&record), "mastered");
    }
}
