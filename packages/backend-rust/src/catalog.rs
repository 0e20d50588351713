//! Reference data: modules, micro-skills, and the question bank.
//!
//! The catalog is immutable once built. Content management (authoring,
//! import, lifecycle transitions) lives in the surrounding CRUD layer; the
//! engine only reads servable questions.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Drills per module. Drill N+1 unlocks when drill N completes.
pub const DRILLS_PER_MODULE: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    Numeric,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Draft,
    Active,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub module_id: i64,
    pub skill_id: i64,
    pub difficulty: u8,
    pub expected_time_seconds: i64,
    pub text: String,
    pub question_type: QuestionType,
    /// Choice texts for MCQ questions, indexed by letter (A, B, C, ...).
    pub options: Vec<String>,
    pub correct_answer: String,
    pub solution_steps: Vec<String>,
    pub hints: Vec<String>,
    pub status: QuestionStatus,
}

impl Question {
    /// Only active and published questions are served to sessions.
    pub fn is_servable(&self) -> bool {
        matches!(
            self.status,
            QuestionStatus::Active | QuestionStatus::Published
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroSkill {
    pub id: i64,
    pub module_id: i64,
    pub name: String,
    pub description: String,
    pub estimated_time_seconds: i64,
    /// Skill ids the user should have worked on before this one counts as
    /// eligible.
    pub prerequisites: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub skill_ids: Vec<i64>,
    pub drill_count: i64,
}

/// In-process index over the reference data.
pub struct Catalog {
    modules: BTreeMap<i64, Module>,
    skills: BTreeMap<i64, MicroSkill>,
    questions: HashMap<String, Question>,
    questions_by_skill: HashMap<i64, Vec<String>>,
}

impl Catalog {
    pub fn new(modules: Vec<Module>, skills: Vec<MicroSkill>, questions: Vec<Question>) -> Self {
        let mut questions_by_skill: HashMap<i64, Vec<String>> = HashMap::new();
        let mut question_map = HashMap::with_capacity(questions.len());
        for question in questions {
            questions_by_skill
                .entry(question.skill_id)
                .or_default()
                .push(question.id.clone());
            question_map.insert(question.id.clone(), question);
        }

        Self {
            modules: modules.into_iter().map(|m| (m.id, m)).collect(),
            skills: skills.into_iter().map(|s| (s.id, s)).collect(),
            questions: question_map,
            questions_by_skill,
        }
    }

    pub fn module(&self, module_id: i64) -> Option<&Module> {
        self.modules.get(&module_id)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn skill(&self, skill_id: i64) -> Option<&MicroSkill> {
        self.skills.get(&skill_id)
    }

    pub fn skills_for_module(&self, module_id: i64) -> Vec<&MicroSkill> {
        self.module(module_id)
            .map(|module| {
                module
                    .skill_ids
                    .iter()
                    .filter_map(|id| self.skills.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.get(question_id)
    }

    pub fn questions_for_skill(&self, skill_id: i64) -> Vec<&Question> {
        self.questions_by_skill
            .get(&skill_id)
            .map(|ids| ids.iter().filter_map(|id| self.questions.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}
