//! Question bank accessor: read-only draws from the catalog with
//! duplicate exclusion and nearest-difficulty fallback.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::catalog::{Catalog, Question};

/// Draw up to `count` servable questions for one skill, preferring the
/// target difficulty and widening the search level by level when a level
/// is exhausted. Returns fewer than `count` only when the whole skill is
/// out of unseen questions.
pub fn draw_questions<'a>(
    catalog: &'a Catalog,
    skill_id: i64,
    target_difficulty: u8,
    count: usize,
    exclude: &HashSet<String>,
    rng: &mut StdRng,
) -> Vec<&'a Question> {
    let mut drawn: Vec<&Question> = Vec::with_capacity(count);
    if count == 0 {
        return drawn;
    }

    let pool = catalog.questions_for_skill(skill_id);

    // Distance 0 is the exact level; widening alternates below and above.
    for distance in 0u8..10 {
        for level in levels_at_distance(target_difficulty, distance) {
            let mut candidates: Vec<&Question> = pool
                .iter()
                .filter(|q| {
                    q.difficulty == level
                        && q.is_servable()
                        && !exclude.contains(&q.id)
                        && !drawn.iter().any(|d| d.id == q.id)
                })
                .copied()
                .collect();
            candidates.shuffle(rng);

            for question in candidates {
                if drawn.len() == count {
                    return drawn;
                }
                drawn.push(question);
            }
        }
        if drawn.len() == count {
            break;
        }
    }

    drawn
}

fn levels_at_distance(target: u8, distance: u8) -> Vec<u8> {
    if distance == 0 {
        return vec![target];
    }
    let mut levels = Vec::with_capacity(2);
    if target > distance && target - distance >= 1 {
        levels.push(target - distance);
    }
    if target + distance <= 10 {
        levels.push(target + distance);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MicroSkill, Module, QuestionStatus, QuestionType};
    use rand::SeedableRng;

    fn catalog_with(questions: Vec<Question>) -> Catalog {
        Catalog::new(
            vec![Module {
                id: 1,
                name: "m".to_string(),
                description: String::new(),
                skill_ids: vec![101],
                drill_count: 5,
            }],
            vec![MicroSkill {
                id: 101,
                module_id: 1,
                name: "s".to_string(),
                description: String::new(),
                estimated_time_seconds: 8,
                prerequisites: Vec::new(),
            }],
            questions,
        )
    }

    fn question(id: &str, difficulty: u8, status: QuestionStatus) -> Question {
        Question {
            id: id.to_string(),
            module_id: 1,
            skill_id: 101,
            difficulty,
            expected_time_seconds: 10,
            text: "1 + 1 = ?".to_string(),
            question_type: QuestionType::Numeric,
            options: Vec::new(),
            correct_answer: "2".to_string(),
            solution_steps: Vec::new(),
            hints: Vec::new(),
            status,
        }
    }

    #[test]
    fn test_prefers_exact_difficulty() {
        let catalog = catalog_with(vec![
            question("a", 3, QuestionStatus::Active),
            question("b", 3, QuestionStatus::Active),
            question("c", 5, QuestionStatus::Active),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let drawn = draw_questions(&catalog, 101, 3, 2, &HashSet::new(), &mut rng);
        assert_eq!(drawn.len(), 2);
        assert!(drawn.iter().all(|q| q.difficulty == 3));
    }

    #[test]
    fn test_falls_back_to_nearest_level() {
        let catalog = catalog_with(vec![
            question("a", 3, QuestionStatus::Active),
            question("near", 4, QuestionStatus::Active),
            question("far", 9, QuestionStatus::Active),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let drawn = draw_questions(&catalog, 101, 3, 2, &HashSet::new(), &mut rng);
        assert_eq!(drawn.len(), 2);
        assert!(drawn.iter().any(|q| q.id == "a"));
        assert!(drawn.iter().any(|q| q.id == "near"));
    }

    #[test]
    fn test_excludes_seen_and_unservable() {
        let catalog = catalog_with(vec![
            question("seen", 3, QuestionStatus::Active),
            question("draft", 3, QuestionStatus::Draft),
            question("archived", 3, QuestionStatus::Archived),
            question("fresh", 3, QuestionStatus::Published),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let exclude: HashSet<String> = ["seen".to_string()].into_iter().collect();
        let drawn = draw_questions(&catalog, 101, 3, 4, &exclude, &mut rng);
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].id, "fresh");
    }

    #[test]
    fn test_never_draws_duplicates() {
        let catalog = catalog_with(vec![
            question("a", 2, QuestionStatus::Active),
            question("b", 2, QuestionStatus::Active),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let drawn = draw_questions(&catalog, 101, 2, 10, &HashSet::new(), &mut rng);
        assert_eq!(drawn.len(), 2);
        assert_ne!(drawn[0].id, drawn[1].id);
    }
}
