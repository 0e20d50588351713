//! Threshold-driven difficulty stepping.

use serde::{Deserialize, Serialize};

use crate::types::clamp_difficulty;

const HIGH_ACCURACY_THRESHOLD: f64 = 0.8;
const LOW_ACCURACY_THRESHOLD: f64 = 0.4;
const MIN_SAMPLES_TO_ADVANCE: usize = 3;

/// Tuning knobs for the difficulty step policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdaptationConfig {
    pub high_threshold: f64,
    pub low_threshold: f64,
    /// Minimum attempts in the rolling window before a step *up* is allowed.
    pub min_samples: usize,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            high_threshold: HIGH_ACCURACY_THRESHOLD,
            low_threshold: LOW_ACCURACY_THRESHOLD,
            min_samples: MIN_SAMPLES_TO_ADVANCE,
        }
    }
}

/// Compute the next difficulty level from the current one and the recent
/// rolling accuracy.
///
/// A struggling run (accuracy at or below the low threshold) steps down
/// immediately; stepping up additionally requires `min_samples` attempts so
/// a single lucky answer cannot escalate the level. The result is always
/// clamped to the 1-10 scale.
pub fn next_difficulty(
    current: u8,
    recent_accuracy: f64,
    sample_size: usize,
    config: &AdaptationConfig,
) -> u8 {
    let current = clamp_difficulty(current as i32);

    if recent_accuracy <= config.low_threshold {
        return clamp_difficulty(current as i32 - 1);
    }

    if recent_accuracy >= config.high_threshold && sample_size >= config.min_samples {
        return clamp_difficulty(current as i32 + 1);
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MAX_DIFFICULTY, MIN_DIFFICULTY};

    #[test]
    fn test_step_up_on_high_accuracy() {
        let config = AdaptationConfig::default();
        assert_eq!(next_difficulty(4, 0.9, 5, &config), 5);
        assert_eq!(next_difficulty(4, 0.8, 3, &config), 5);
    }

    #[test]
    fn test_step_up_capped_at_max() {
        let config = AdaptationConfig::default();
        assert_eq!(next_difficulty(MAX_DIFFICULTY, 1.0, 10, &config), MAX_DIFFICULTY);
    }

    #[test]
    fn test_no_step_up_below_min_samples() {
        let config = AdaptationConfig::default();
        assert_eq!(next_difficulty(4, 1.0, 2, &config), 4);
    }

    #[test]
    fn test_step_down_on_low_accuracy() {
        let config = AdaptationConfig::default();
        assert_eq!(next_difficulty(4, 0.4, 5, &config), 3);
        assert_eq!(next_difficulty(4, 0.0, 1, &config), 3);
    }

    #[test]
    fn test_step_down_floored_at_min() {
        let config = AdaptationConfig::default();
        assert_eq!(next_difficulty(MIN_DIFFICULTY, 0.1, 5, &config), MIN_DIFFICULTY);
    }

    #[test]
    fn test_unchanged_in_middle_band() {
        let config = AdaptationConfig::default();
        assert_eq!(next_difficulty(6, 0.6, 10, &config), 6);
        assert_eq!(next_difficulty(6, 0.79, 10, &config), 6);
        assert_eq!(next_difficulty(6, 0.41, 10, &config), 6);
    }

    #[test]
    fn test_deterministic() {
        let config = AdaptationConfig::default();
        let a = next_difficulty(5, 0.85, 7, &config);
        let b = next_difficulty(5, 0.85, 7, &config);
        assert_eq!(a, b);
    }
}
