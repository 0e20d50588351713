//! Session pacing analysis: fatigue detection and time/difficulty profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Minimum answers before fatigue detection is attempted.
const MIN_SAMPLES_FOR_FATIGUE: usize = 8;
/// Accuracy drop (early quartile minus late quartile) that flags fatigue.
const FATIGUE_ACCURACY_DROP: f64 = 0.2;
/// Slowdown factor (late avg time over early avg time) that flags fatigue.
const FATIGUE_SLOWDOWN_FACTOR: f64 = 1.5;

/// One answered question, in submission order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnswerSample {
    pub is_correct: bool,
    pub time_spent_seconds: f64,
    pub difficulty: u8,
}

/// Early-vs-late comparison over a full session's answer trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacingReport {
    pub fatigue_detected: bool,
    pub early_accuracy: Option<f64>,
    pub late_accuracy: Option<f64>,
    pub early_avg_time_seconds: Option<f64>,
    pub late_avg_time_seconds: Option<f64>,
    /// Average answering time per difficulty level, ascending by level.
    pub avg_time_by_difficulty: Vec<(u8, f64)>,
}

fn accuracy(samples: &[AnswerSample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let correct = samples.iter().filter(|s| s.is_correct).count();
    Some(correct as f64 / samples.len() as f64)
}

fn avg_time(samples: &[AnswerSample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().map(|s| s.time_spent_seconds).sum::<f64>() / samples.len() as f64)
}

/// Compare the first quartile of the trail against the last quartile.
///
/// Fatigue is flagged when accuracy degrades by at least 0.2 or answering
/// slows past 1.5x between the two. Short sessions (< 8 answers) never
/// flag, since a quartile of one or two answers is all noise.
pub fn analyze_pacing(samples: &[AnswerSample]) -> PacingReport {
    let quartile = (samples.len() / 4).max(1);
    let (early, late) = if samples.len() >= MIN_SAMPLES_FOR_FATIGUE {
        (&samples[..quartile], &samples[samples.len() - quartile..])
    } else {
        (&samples[..0], &samples[..0])
    };

    let early_accuracy = accuracy(early);
    let late_accuracy = accuracy(late);
    let early_avg_time_seconds = avg_time(early);
    let late_avg_time_seconds = avg_time(late);

    let accuracy_degraded = match (early_accuracy, late_accuracy) {
        (Some(e), Some(l)) => e - l >= FATIGUE_ACCURACY_DROP,
        _ => false,
    };
    let speed_degraded = match (early_avg_time_seconds, late_avg_time_seconds) {
        (Some(e), Some(l)) if e > 0.0 => l / e >= FATIGUE_SLOWDOWN_FACTOR,
        _ => false,
    };

    let mut by_difficulty: BTreeMap<u8, (f64, usize)> = BTreeMap::new();
    for sample in samples {
        let entry = by_difficulty.entry(sample.difficulty).or_insert((0.0, 0));
        entry.0 += sample.time_spent_seconds;
        entry.1 += 1;
    }
    let avg_time_by_difficulty = by_difficulty
        .into_iter()
        .map(|(level, (sum, count))| (level, sum / count as f64))
        .collect();

    PacingReport {
        fatigue_detected: accuracy_degraded || speed_degraded,
        early_accuracy,
        late_accuracy,
        early_avg_time_seconds,
        late_avg_time_seconds,
        avg_time_by_difficulty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(is_correct: bool, seconds: f64, difficulty: u8) -> AnswerSample {
        AnswerSample {
            is_correct,
            time_spent_seconds: seconds,
            difficulty,
        }
    }

    #[test]
    fn test_short_session_never_flags() {
        let samples = vec![
            sample(true, 3.0, 1),
            sample(false, 9.0, 1),
            sample(false, 12.0, 1),
        ];
        let report = analyze_pacing(&samples);
        assert!(!report.fatigue_detected);
        assert_eq!(report.early_accuracy, None);
    }

    #[test]
    fn test_accuracy_degradation_flags_fatigue() {
        // 12 answers: first quartile all correct, last quartile all wrong.
        let mut samples = vec![sample(true, 4.0, 2); 9];
        samples.extend(vec![sample(false, 4.0, 2); 3]);
        let report = analyze_pacing(&samples);
        assert!(report.fatigue_detected);
        assert_eq!(report.early_accuracy, Some(1.0));
        assert_eq!(report.late_accuracy, Some(0.0));
    }

    #[test]
    fn test_slowdown_flags_fatigue() {
        let mut samples = vec![sample(true, 3.0, 2); 6];
        samples.extend(vec![sample(true, 9.0, 2); 2]);
        let report = analyze_pacing(&samples);
        assert!(report.fatigue_detected);
    }

    #[test]
    fn test_steady_session_does_not_flag() {
        let samples = vec![sample(true, 5.0, 3); 12];
        let report = analyze_pacing(&samples);
        assert!(!report.fatigue_detected);
        assert_eq!(report.early_accuracy, Some(1.0));
        assert_eq!(report.late_accuracy, Some(1.0));
    }

    #[test]
    fn test_avg_time_by_difficulty_sorted() {
        let samples = vec![
            sample(true, 10.0, 5),
            sample(true, 2.0, 1),
            sample(true, 4.0, 1),
            sample(false, 20.0, 5),
        ];
        let report = analyze_pacing(&samples);
        assert_eq!(report.avg_time_by_difficulty, vec![(1, 3.0), (5, 15.0)]);
    }
}
