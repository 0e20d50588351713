//! Bounded rolling window of attempt outcomes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::ROLLING_WINDOW_SIZE;

/// Last-N attempt outcomes for one (user, micro-skill) pair.
///
/// Serialized as part of the mastery record, so the window survives across
/// sessions. Accuracy is undefined (None) until the first attempt lands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
}

impl Default for AttemptWindow {
    fn default() -> Self {
        Self::new(ROLLING_WINDOW_SIZE)
    }
}

impl AttemptWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Record one outcome, evicting the oldest when the window is full.
    pub fn push(&mut self, is_correct: bool) {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(is_correct);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Rolling accuracy over the window, or None before any attempt.
    pub fn accuracy(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let correct = self.outcomes.iter().filter(|c| **c).count();
        Some(correct as f64 / self.outcomes.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_has_no_accuracy() {
        let window = AttemptWindow::default();
        assert!(window.is_empty());
        assert_eq!(window.accuracy(), None);
    }

    #[test]
    fn test_accuracy_over_outcomes() {
        let mut window = AttemptWindow::default();
        window.push(true);
        window.push(true);
        window.push(false);
        window.push(true);
        assert_eq!(window.len(), 4);
        assert_eq!(window.accuracy(), Some(0.75));
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut window = AttemptWindow::new(3);
        window.push(false);
        window.push(false);
        window.push(false);
        // Three misses, then three hits: the misses roll out.
        window.push(true);
        window.push(true);
        window.push(true);
        assert_eq!(window.len(), 3);
        assert_eq!(window.accuracy(), Some(1.0));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut window = AttemptWindow::new(5);
        window.push(true);
        window.push(false);
        let json = serde_json::to_string(&window).unwrap();
        let restored: AttemptWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.accuracy(), Some(0.5));
    }
}
