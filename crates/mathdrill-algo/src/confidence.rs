//! Per-answer confidence scoring.
//!
//! Maps correctness plus relative answering speed to a 0-100 score. The
//! mapping is monotonically non-increasing in the time ratio for fixed
//! correctness, and a correct answer always outscores an incorrect answer
//! taken at the same speed.

use serde::{Deserialize, Serialize};

const FAST_RATIO: f64 = 0.5;
const SLOW_RATIO: f64 = 2.0;

const CORRECT_CEILING: f64 = 100.0;
const CORRECT_SPEED_SPAN: f64 = 45.0;
const INCORRECT_CEILING: f64 = 40.0;
const INCORRECT_SPEED_SPAN: f64 = 35.0;

/// Bucket boundaries used by the session summary (>80 / 50-80 / <50).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    pub fn from_score(score: u8) -> Self {
        if score > 80 {
            ConfidenceBucket::High
        } else if score >= 50 {
            ConfidenceBucket::Medium
        } else {
            ConfidenceBucket::Low
        }
    }
}

/// Score one answer.
///
/// `time_spent_seconds` is the user's wall-clock time; `expected_seconds`
/// is the question's expected answering time. A ratio at or below 0.5 is
/// considered fully fast, at or above 2.0 fully slow, with linear
/// interpolation between.
pub fn confidence_score(is_correct: bool, time_spent_seconds: f64, expected_seconds: f64) -> u8 {
    let expected = expected_seconds.max(1.0);
    let ratio = (time_spent_seconds.max(0.0) / expected).clamp(FAST_RATIO, SLOW_RATIO);
    let slowness = (ratio - FAST_RATIO) / (SLOW_RATIO - FAST_RATIO);

    let score = if is_correct {
        CORRECT_CEILING - CORRECT_SPEED_SPAN * slowness
    } else {
        INCORRECT_CEILING - INCORRECT_SPEED_SPAN * slowness
    };

    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_correct_is_full_confidence() {
        assert_eq!(confidence_score(true, 2.0, 10.0), 100);
    }

    #[test]
    fn test_slow_correct_still_above_half() {
        let score = confidence_score(true, 30.0, 10.0);
        assert_eq!(score, 55);
    }

    #[test]
    fn test_incorrect_never_reaches_medium_ceiling() {
        assert!(confidence_score(false, 1.0, 10.0) <= 40);
        assert!(confidence_score(false, 60.0, 10.0) >= 5);
    }

    #[test]
    fn test_monotonic_in_time_ratio() {
        let mut prev = u8::MAX;
        for seconds in [1, 5, 8, 12, 16, 20, 40] {
            let score = confidence_score(true, seconds as f64, 10.0);
            assert!(score <= prev, "score rose as the answer got slower");
            prev = score;
        }
    }

    #[test]
    fn test_correct_beats_incorrect_at_same_speed() {
        for seconds in [2.0, 10.0, 25.0] {
            assert!(confidence_score(true, seconds, 10.0) > confidence_score(false, seconds, 10.0));
        }
    }

    #[test]
    fn test_bucket_thresholds() {
        assert_eq!(ConfidenceBucket::from_score(81), ConfidenceBucket::High);
        assert_eq!(ConfidenceBucket::from_score(80), ConfidenceBucket::Medium);
        assert_eq!(ConfidenceBucket::from_score(50), ConfidenceBucket::Medium);
        assert_eq!(ConfidenceBucket::from_score(49), ConfidenceBucket::Low);
    }

    #[test]
    fn test_zero_expected_time_does_not_panic() {
        let score = confidence_score(true, 3.0, 0.0);
        assert!(score <= 100);
    }
}
