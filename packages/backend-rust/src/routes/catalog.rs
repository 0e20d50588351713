use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::catalog::{MicroSkill, Module};
use crate::engine::EngineError;
use crate::response::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_modules))
        .route("/:module_id", get(get_module))
}

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModuleView {
    id: i64,
    name: String,
    description: String,
    drill_count: i64,
    skills: Vec<SkillView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SkillView {
    id: i64,
    name: String,
    description: String,
    estimated_time_seconds: i64,
    prerequisites: Vec<i64>,
    question_count: usize,
}

async fn list_modules(State(state): State<AppState>) -> Response {
    let modules: Vec<ModuleView> = state
        .catalog()
        .modules()
        .map(|module| module_view(&state, module))
        .collect();

    Json(SuccessResponse {
        success: true,
        data: modules,
    })
    .into_response()
}

async fn get_module(State(state): State<AppState>, Path(module_id): Path<i64>) -> Response {
    let Some(module) = state.catalog().module(module_id) else {
        return AppError::from(EngineError::ModuleNotFound(module_id)).into_response();
    };

    Json(SuccessResponse {
        success: true,
        data: module_view(&state, module),
    })
    .into_response()
}

fn module_view(state: &AppState, module: &Module) -> ModuleView {
    let skills = state
        .catalog()
        .skills_for_module(module.id)
        .into_iter()
        .map(|skill| skill_view(state, skill))
        .collect();

    ModuleView {
        id: module.id,
        name: module.name.clone(),
        description: module.description.clone(),
        drill_count: module.drill_count,
        skills,
    }
}

fn skill_view(state: &AppState, skill: &MicroSkill) -> SkillView {
    let servable = state
        .catalog()
        .questions_for_skill(skill.id)
        .into_iter()
        .filter(|q| q.is_servable())
        .count();

    SkillView {
        id: skill.id,
        name: skill.name.clone(),
        description: skill.description.clone(),
        estimated_time_seconds: skill.estimated_time_seconds,
        prerequisites: skill.prerequisites.clone(),
        question_count: servable,
    }
}
