//! Session planner: turns a start-practice or start-drill request into a
//! committed, ordered question plan.
//!
//! Planning: determine eligible micro-skills (prerequisites satisfied),
//! weight them by inverse mastery, allocate per-skill counts, draw unseen
//! questions at each skill's current difficulty, interleave round-robin,
//! and persist the plan as a new active session.

use chrono::Utc;
use mathdrill_algo::{allocate, interleave, AllocationError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::catalog::{Catalog, MicroSkill};
use crate::engine::bank::draw_questions;
use crate::engine::error::EngineError;
use crate::engine::mastery::get_mastery;
use crate::store::{
    DrillStore, PlannedQuestion, SessionKind, SessionRecord, SessionStatus,
};

/// Fixed size of a drill session.
pub const DRILL_SESSION_SIZE: usize = 10;
/// Practice sessions accept 1-20 questions.
pub const MAX_PRACTICE_SIZE: usize = 20;

/// A prerequisite skill counts as satisfied once the user has a few
/// attempts on it at reasonable accuracy.
const PREREQ_MIN_ATTEMPTS: i64 = 3;
const PREREQ_ACCURACY: f64 = 0.6;

struct WeightedSkill {
    skill_id: i64,
    weight: f64,
    difficulty: u8,
}

pub async fn start_practice(
    store: &dyn DrillStore,
    catalog: &Catalog,
    user_id: &str,
    session_size: usize,
    focus_modules: &[i64],
) -> Result<SessionRecord, EngineError> {
    if session_size == 0 || session_size > MAX_PRACTICE_SIZE {
        return Err(EngineError::Invalid(format!(
            "session size must be between 1 and {MAX_PRACTICE_SIZE}"
        )));
    }

    let module_ids: Vec<i64> = if focus_modules.is_empty() {
        catalog.modules().map(|m| m.id).collect()
    } else {
        for module_id in focus_modules {
            if catalog.module(*module_id).is_none() {
                return Err(EngineError::ModuleNotFound(*module_id));
            }
        }
        focus_modules.to_vec()
    };

    let module_id = match module_ids.as_slice() {
        [only] => Some(*only),
        _ => None,
    };

    plan_session(
        store,
        catalog,
        user_id,
        &module_ids,
        session_size,
        SessionKind::Practice,
        module_id,
        None,
    )
    .await
}

pub async fn start_drill(
    store: &dyn DrillStore,
    catalog: &Catalog,
    user_id: &str,
    module_id: i64,
    drill_number: i64,
) -> Result<SessionRecord, EngineError> {
    let module = catalog
        .module(module_id)
        .ok_or(EngineError::ModuleNotFound(module_id))?;

    if drill_number < 1 || drill_number > module.drill_count {
        return Err(EngineError::Invalid(format!(
            "drill number must be between 1 and {}",
            module.drill_count
        )));
    }

    // Drill 1 is always open; drill N needs drill N-1 completed.
    if drill_number > 1 {
        let progress = store.drill_progress(user_id, module_id).await?;
        let previous_done = progress
            .iter()
            .any(|p| p.drill_number == drill_number - 1);
        if !previous_done {
            return Err(EngineError::DrillLocked {
                requested: drill_number,
                required: drill_number - 1,
            });
        }
    }

    plan_session(
        store,
        catalog,
        user_id,
        &[module_id],
        DRILL_SESSION_SIZE,
        SessionKind::Drill,
        Some(module_id),
        Some(drill_number),
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn plan_session(
    store: &dyn DrillStore,
    catalog: &Catalog,
    user_id: &str,
    module_ids: &[i64],
    session_size: usize,
    kind: SessionKind,
    module_id: Option<i64>,
    drill_number: Option<i64>,
) -> Result<SessionRecord, EngineError> {
    if let Some(active) = store.find_active_session(user_id).await? {
        return Err(EngineError::ActiveSessionExists {
            session_id: active.id,
        });
    }

    let eligible = eligible_skills(store, catalog, user_id, module_ids).await?;
    if eligible.is_empty() {
        return Err(EngineError::NoEligibleSkills);
    }

    let weighted = weigh_skills(store, user_id, &eligible).await?;
    let weights: Vec<(i64, f64)> = weighted.iter().map(|w| (w.skill_id, w.weight)).collect();
    let allocations = allocate(session_size, &weights).map_err(|err| match err {
        AllocationError::NoEligibleSkills => EngineError::NoEligibleSkills,
        AllocationError::EmptySession => EngineError::Invalid(err.to_string()),
    })?;

    let mut exclude = store.seen_question_ids(user_id).await?;
    let mut rng = StdRng::from_os_rng();
    let mut groups: Vec<Vec<PlannedQuestion>> = Vec::with_capacity(weighted.len());

    for (allocation, skill) in allocations.iter().zip(weighted.iter()) {
        let drawn = draw_questions(
            catalog,
            skill.skill_id,
            skill.difficulty,
            allocation.count,
            &exclude,
            &mut rng,
        );
        for question in &drawn {
            exclude.insert(question.id.clone());
        }
        groups.push(
            drawn
                .into_iter()
                .map(|q| PlannedQuestion {
                    question_id: q.id.clone(),
                    skill_id: q.skill_id,
                    module_id: q.module_id,
                    difficulty: q.difficulty,
                })
                .collect(),
        );
    }

    // Top up from any eligible skill when some skill ran out of unseen
    // inventory, one question per skill per round.
    let mut planned_total: usize = groups.iter().map(Vec::len).sum();
    while planned_total < session_size {
        let mut progressed = false;
        for (group, skill) in groups.iter_mut().zip(weighted.iter()) {
            if planned_total == session_size {
                break;
            }
            let extra =
                draw_questions(catalog, skill.skill_id, skill.difficulty, 1, &exclude, &mut rng);
            if let Some(question) = extra.first() {
                exclude.insert(question.id.clone());
                group.push(PlannedQuestion {
                    question_id: question.id.clone(),
                    skill_id: question.skill_id,
                    module_id: question.module_id,
                    difficulty: question.difficulty,
                });
                planned_total += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    let planned = interleave(groups);
    if planned.is_empty() {
        return Err(EngineError::NoEligibleSkills);
    }

    let session = SessionRecord {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        kind,
        module_id,
        drill_number,
        total_questions: planned.len() as i64,
        planned,
        current_position: 0,
        status: SessionStatus::Active,
        started_at: Utc::now(),
        ended_at: None,
        summary: None,
    };

    store.insert_session(&session).await?;
    tracing::info!(
        session_id = %session.id,
        user_id,
        kind = kind.as_str(),
        total = session.total_questions,
        "session planned"
    );

    Ok(session)
}

/// Skills across the given modules whose prerequisites the user has
/// already satisfied.
async fn eligible_skills<'a>(
    store: &dyn DrillStore,
    catalog: &'a Catalog,
    user_id: &str,
    module_ids: &[i64],
) -> Result<Vec<&'a MicroSkill>, EngineError> {
    let mut eligible = Vec::new();
    for module_id in module_ids {
        for skill in catalog.skills_for_module(*module_id) {
            if prerequisites_satisfied(store, user_id, skill).await? {
                eligible.push(skill);
            }
        }
    }
    Ok(eligible)
}

async fn prerequisites_satisfied(
    store: &dyn DrillStore,
    user_id: &str,
    skill: &MicroSkill,
) -> Result<bool, EngineError> {
    for prereq_id in &skill.prerequisites {
        let record = get_mastery(store, user_id, *prereq_id).await?;
        let accuracy = record.rolling_accuracy().unwrap_or(0.0);
        if record.total_attempts < PREREQ_MIN_ATTEMPTS || accuracy < PREREQ_ACCURACY {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Inverse-mastery weighting: a skill the user struggles with (or has
/// never seen) weighs more than one already mastered.
async fn weigh_skills(
    store: &dyn DrillStore,
    user_id: &str,
    skills: &[&MicroSkill],
) -> Result<Vec<WeightedSkill>, EngineError> {
    let mut weighted = Vec::with_capacity(skills.len());
    for skill in skills {
        let record = get_mastery(store, user_id, skill.id).await?;
        let accuracy = record.rolling_accuracy().unwrap_or(0.0);
        weighted.push(WeightedSkill {
            skill_id: skill.id,
            weight: 1.0 + (1.0 - accuracy),
            difficulty: record.current_difficulty,
        });
    }
    Ok(weighted)
}

/// Sum of expected answering time for the plan's remaining questions.
pub fn remaining_time_seconds(
    catalog: &Catalog,
    planned: &[PlannedQuestion],
    from_position: i64,
) -> i64 {
    let start = usize::try_from(from_position).unwrap_or(0);
    planned
        .iter()
        .skip(start)
        .filter_map(|p| catalog.question(&p.question_id))
        .map(|q| q.expected_time_seconds)
        .sum()
}
