//! Builds the seeded reference catalog: mental-arithmetic modules, their
//! micro-skills, and a generated question bank.
//!
//! Generation is deterministic (fixed RNG seed) so every boot serves the
//! same bank and tests can rely on inventory being present at every
//! difficulty level.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::catalog::{
    Catalog, MicroSkill, Module, Question, QuestionStatus, QuestionType, DRILLS_PER_MODULE,
};

const SEED: u64 = 0x6d41_7468;
const QUESTIONS_PER_LEVEL: usize = 8;

const OPTION_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

#[derive(Clone, Copy)]
enum Operation {
    Add,
    Sub,
    Mul,
}

impl Operation {
    fn symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "×",
        }
    }

    fn apply(self, a: i64, b: i64) -> i64 {
        match self {
            Operation::Add => a + b,
            Operation::Sub => a - b,
            Operation::Mul => a * b,
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Operation::Add => "Add the tens first, then the units.",
            Operation::Sub => "Subtract the tens first, then adjust with the units.",
            Operation::Mul => "Break one factor into tens and units and multiply each part.",
        }
    }
}

struct SkillSpec {
    id: i64,
    module_id: i64,
    name: &'static str,
    description: &'static str,
    estimated_time_seconds: i64,
    prerequisites: &'static [i64],
    op: Operation,
    /// Operand ceiling at difficulty 1; scales linearly with difficulty.
    operand_base: i64,
}

const SKILLS: &[SkillSpec] = &[
    SkillSpec {
        id: 101,
        module_id: 1,
        name: "Single-digit addition",
        description: "Sums of two numbers below ten",
        estimated_time_seconds: 6,
        prerequisites: &[],
        op: Operation::Add,
        operand_base: 4,
    },
    SkillSpec {
        id: 102,
        module_id: 1,
        name: "Two-digit addition",
        description: "Sums of two-digit numbers with carrying",
        estimated_time_seconds: 10,
        prerequisites: &[101],
        op: Operation::Add,
        operand_base: 20,
    },
    SkillSpec {
        id: 103,
        module_id: 1,
        name: "Three-digit addition",
        description: "Sums of three-digit numbers",
        estimated_time_seconds: 15,
        prerequisites: &[102],
        op: Operation::Add,
        operand_base: 120,
    },
    SkillSpec {
        id: 201,
        module_id: 2,
        name: "Single-digit subtraction",
        description: "Differences of numbers below ten",
        estimated_time_seconds: 6,
        prerequisites: &[],
        op: Operation::Sub,
        operand_base: 4,
    },
    SkillSpec {
        id: 202,
        module_id: 2,
        name: "Two-digit subtraction",
        description: "Differences of two-digit numbers with borrowing",
        estimated_time_seconds: 11,
        prerequisites: &[201],
        op: Operation::Sub,
        operand_base: 20,
    },
    SkillSpec {
        id: 301,
        module_id: 3,
        name: "Times tables",
        description: "Products up to 12 × 12",
        estimated_time_seconds: 7,
        prerequisites: &[],
        op: Operation::Mul,
        operand_base: 3,
    },
    SkillSpec {
        id: 302,
        module_id: 3,
        name: "Two-digit multiplication",
        description: "One two-digit factor times one single-digit factor",
        estimated_time_seconds: 16,
        prerequisites: &[301],
        op: Operation::Mul,
        operand_base: 8,
    },
];

struct ModuleSpec {
    id: i64,
    name: &'static str,
    description: &'static str,
}

const MODULES: &[ModuleSpec] = &[
    ModuleSpec {
        id: 1,
        name: "Speed Addition",
        description: "Fast and accurate mental addition",
    },
    ModuleSpec {
        id: 2,
        name: "Speed Subtraction",
        description: "Fast and accurate mental subtraction",
    },
    ModuleSpec {
        id: 3,
        name: "Multiplication",
        description: "Times tables and beyond",
    },
];

/// Build the full seeded catalog.
pub fn seed_catalog() -> Catalog {
    let mut rng = StdRng::seed_from_u64(SEED);

    let modules: Vec<Module> = MODULES
        .iter()
        .map(|spec| Module {
            id: spec.id,
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            skill_ids: SKILLS
                .iter()
                .filter(|s| s.module_id == spec.id)
                .map(|s| s.id)
                .collect(),
            drill_count: DRILLS_PER_MODULE,
        })
        .collect();

    let skills: Vec<MicroSkill> = SKILLS
        .iter()
        .map(|spec| MicroSkill {
            id: spec.id,
            module_id: spec.module_id,
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            estimated_time_seconds: spec.estimated_time_seconds,
            prerequisites: spec.prerequisites.to_vec(),
        })
        .collect();

    let mut questions = Vec::new();
    for spec in SKILLS {
        for difficulty in 1..=10u8 {
            for index in 0..QUESTIONS_PER_LEVEL {
                questions.push(generate_question(spec, difficulty, index, &mut rng));
            }
        }
    }

    tracing::debug!(
        modules = modules.len(),
        skills = skills.len(),
        questions = questions.len(),
        "seeded question catalog"
    );

    Catalog::new(modules, skills, questions)
}

fn generate_question(spec: &SkillSpec, difficulty: u8, index: usize, rng: &mut StdRng) -> Question {
    let ceiling = (spec.operand_base * difficulty as i64).max(3);
    let mut a = rng.random_range(1..=ceiling);
    let mut b = rng.random_range(1..=ceiling);
    if matches!(spec.op, Operation::Sub) && b > a {
        std::mem::swap(&mut a, &mut b);
    }
    let answer = spec.op.apply(a, b);
    let symbol = spec.op.symbol();

    let id = format!("m{}-s{}-d{}-{:02}", spec.module_id, spec.id, difficulty, index);
    let expected_time_seconds = spec.estimated_time_seconds + difficulty as i64;

    // Every 20th question stays in draft to exercise lifecycle filtering;
    // the rest alternate between active and published.
    let status = if index == 7 && difficulty % 3 == 0 {
        QuestionStatus::Draft
    } else if index % 2 == 0 {
        QuestionStatus::Active
    } else {
        QuestionStatus::Published
    };

    let solution_steps = vec![
        format!("Compute {a} {symbol} {b}."),
        format!("{a} {symbol} {b} = {answer}."),
    ];
    let hints = vec![spec.op.hint().to_string()];

    if index % 6 == 5 {
        // Parity variant, answered as free text.
        let parity = if answer % 2 == 0 { "even" } else { "odd" };
        return Question {
            id,
            module_id: spec.module_id,
            skill_id: spec.id,
            difficulty,
            expected_time_seconds,
            text: format!("Is {a} {symbol} {b} even or odd?"),
            question_type: QuestionType::Text,
            options: Vec::new(),
            correct_answer: parity.to_string(),
            solution_steps: vec![
                format!("{a} {symbol} {b} = {answer}."),
                format!("{answer} is {parity}."),
            ],
            hints,
            status,
        };
    }

    if index % 3 == 0 {
        let (options, correct_letter) = build_options(answer, rng);
        return Question {
            id,
            module_id: spec.module_id,
            skill_id: spec.id,
            difficulty,
            expected_time_seconds,
            text: format!("{a} {symbol} {b} = ?"),
            question_type: QuestionType::Mcq,
            options,
            correct_answer: correct_letter.to_string(),
            solution_steps,
            hints,
            status,
        };
    }

    Question {
        id,
        module_id: spec.module_id,
        skill_id: spec.id,
        difficulty,
        expected_time_seconds,
        text: format!("{a} {symbol} {b} = ?"),
        question_type: QuestionType::Numeric,
        options: Vec::new(),
        correct_answer: answer.to_string(),
        solution_steps,
        hints,
        status,
    }
}

/// Four answer choices: the correct value plus three nearby distractors,
/// shuffled, returning the letter of the correct slot.
fn build_options(answer: i64, rng: &mut StdRng) -> (Vec<String>, &'static str) {
    let mut values = vec![answer];
    let mut offset = 1i64;
    while values.len() < 4 {
        for candidate in [answer + offset, answer - offset] {
            if values.len() < 4 && !values.contains(&candidate) {
                values.push(candidate);
            }
        }
        offset += rng.random_range(1..=2);
    }
    values.shuffle(rng);

    let correct_index = values
        .iter()
        .position(|v| *v == answer)
        .unwrap_or_default();
    let options = values.into_iter().map(|v| v.to_string()).collect();
    (options, OPTION_LETTERS[correct_index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_deterministic() {
        let a = seed_catalog();
        let b = seed_catalog();
        assert_eq!(a.question_count(), b.question_count());
        let qa = a.questions_for_skill(101);
        let qb = b.questions_for_skill(101);
        assert_eq!(qa.len(), qb.len());
        assert_eq!(qa[0].id, qb[0].id);
        assert_eq!(qa[0].correct_answer, qb[0].correct_answer);
    }

    #[test]
    fn test_every_skill_has_inventory_at_every_level() {
        let catalog = seed_catalog();
        for spec in SKILLS {
            for difficulty in 1..=10u8 {
                let servable = catalog
                    .questions_for_skill(spec.id)
                    .into_iter()
                    .filter(|q| q.difficulty == difficulty && q.is_servable())
                    .count();
                assert!(
                    servable >= 5,
                    "skill {} difficulty {} has only {} servable questions",
                    spec.id,
                    difficulty,
                    servable
                );
            }
        }
    }

    #[test]
    fn test_mcq_options_contain_correct_answer() {
        let catalog = seed_catalog();
        for question in catalog.questions_for_skill(301) {
            if question.question_type == QuestionType::Mcq {
                assert_eq!(question.options.len(), 4);
                let letter_index = OPTION_LETTERS
                    .iter()
                    .position(|l| *l == question.correct_answer)
                    .expect("correct answer is a letter");
                assert!(letter_index < question.options.len());
            }
        }
    }

    #[test]
    fn test_subtraction_never_negative() {
        let catalog = seed_catalog();
        for question in catalog.questions_for_skill(202) {
            if question.question_type == QuestionType::Numeric {
                let answer: i64 = question.correct_answer.parse().unwrap();
                assert!(answer >= 0, "negative answer in {}", question.id);
            }
        }
    }
}
