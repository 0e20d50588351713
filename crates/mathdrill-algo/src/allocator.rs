//! Splits a session of N questions across eligible micro-skills.
//!
//! Uses the largest-remainder method so that integer counts always sum to
//! exactly the requested session size. Every positive-weight skill receives
//! a floor of one question when the session is large enough to permit it;
//! when there are more skills than questions, the highest-weighted skills
//! win the available slots.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// No skill carried a positive weight, so nothing can be allocated.
    NoEligibleSkills,
    /// A session must contain at least one question.
    EmptySession,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationError::NoEligibleSkills => write!(f, "no eligible skills to allocate"),
            AllocationError::EmptySession => write!(f, "session size must be at least 1"),
        }
    }
}

impl std::error::Error for AllocationError {}

/// One skill's share of a planned session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillAllocation {
    pub skill_id: i64,
    pub count: usize,
}

/// Allocate `session_size` question slots across `weights`.
///
/// `weights` pairs each skill id with a priority weight (for example
/// inverse mastery). Skills with a non-positive or non-finite weight are
/// treated as ineligible and receive zero. The returned allocations are in
/// input order, cover every input skill, and always sum to `session_size`.
pub fn allocate(
    session_size: usize,
    weights: &[(i64, f64)],
) -> Result<Vec<SkillAllocation>, AllocationError> {
    if session_size == 0 {
        return Err(AllocationError::EmptySession);
    }

    let eligible: Vec<(usize, i64, f64)> = weights
        .iter()
        .enumerate()
        .filter(|(_, (_, w))| w.is_finite() && *w > 0.0)
        .map(|(idx, (id, w))| (idx, *id, *w))
        .collect();

    if eligible.is_empty() {
        return Err(AllocationError::NoEligibleSkills);
    }

    let mut counts = vec![0usize; weights.len()];

    if eligible.len() >= session_size {
        // More skills than slots: the highest-weighted skills get one each.
        let mut ranked = eligible.clone();
        ranked.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        for (idx, _, _) in ranked.into_iter().take(session_size) {
            counts[idx] = 1;
        }
    } else {
        // Floor of one per eligible skill, then largest-remainder over the rest.
        for (idx, _, _) in &eligible {
            counts[*idx] = 1;
        }
        let remaining = session_size - eligible.len();
        if remaining > 0 {
            let total_weight: f64 = eligible.iter().map(|(_, _, w)| w).sum();
            let mut fractions: Vec<(usize, f64, f64)> = Vec::with_capacity(eligible.len());
            let mut assigned = 0usize;

            for (idx, _, w) in &eligible {
                let share = remaining as f64 * w / total_weight;
                let base = share.floor() as usize;
                counts[*idx] += base;
                assigned += base;
                fractions.push((*idx, share - base as f64, *w));
            }

            // Hand leftover slots to the largest fractional parts, breaking
            // ties toward the heavier weight.
            fractions.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal))
            });
            for (idx, _, _) in fractions.iter().take(remaining - assigned) {
                counts[*idx] += 1;
            }
        }
    }

    Ok(weights
        .iter()
        .zip(counts)
        .map(|((skill_id, _), count)| SkillAllocation {
            skill_id: *skill_id,
            count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(allocations: &[SkillAllocation]) -> usize {
        allocations.iter().map(|a| a.count).sum()
    }

    #[test]
    fn test_exact_sum_even_weights() {
        let allocations = allocate(10, &[(1, 1.0), (2, 1.0), (3, 1.0)]).unwrap();
        assert_eq!(total(&allocations), 10);
    }

    #[test]
    fn test_heavier_weight_gets_more() {
        let allocations = allocate(12, &[(1, 3.0), (2, 1.0)]).unwrap();
        assert_eq!(total(&allocations), 12);
        assert!(allocations[0].count > allocations[1].count);
    }

    #[test]
    fn test_floor_of_one_per_skill() {
        let allocations = allocate(5, &[(1, 100.0), (2, 0.01), (3, 0.01)]).unwrap();
        assert_eq!(total(&allocations), 5);
        for alloc in &allocations {
            assert!(alloc.count >= 1);
        }
    }

    #[test]
    fn test_more_skills_than_slots() {
        let allocations = allocate(2, &[(1, 1.0), (2, 5.0), (3, 3.0), (4, 0.5)]).unwrap();
        assert_eq!(total(&allocations), 2);
        // Slots go to the two heaviest skills.
        assert_eq!(allocations[1].count, 1);
        assert_eq!(allocations[2].count, 1);
        assert_eq!(allocations[0].count, 0);
        assert_eq!(allocations[3].count, 0);
    }

    #[test]
    fn test_zero_weight_skill_excluded() {
        let allocations = allocate(6, &[(1, 2.0), (2, 0.0), (3, 1.0)]).unwrap();
        assert_eq!(total(&allocations), 6);
        assert_eq!(allocations[1].count, 0);
    }

    #[test]
    fn test_no_eligible_skills() {
        assert_eq!(
            allocate(5, &[]).unwrap_err(),
            AllocationError::NoEligibleSkills
        );
        assert_eq!(
            allocate(5, &[(1, 0.0), (2, -1.0)]).unwrap_err(),
            AllocationError::NoEligibleSkills
        );
    }

    #[test]
    fn test_empty_session_rejected() {
        assert_eq!(
            allocate(0, &[(1, 1.0)]).unwrap_err(),
            AllocationError::EmptySession
        );
    }

    #[test]
    fn test_single_skill_takes_everything() {
        let allocations = allocate(20, &[(7, 0.3)]).unwrap();
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].count, 20);
    }
}
