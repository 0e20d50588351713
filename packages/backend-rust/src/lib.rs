pub mod catalog;
pub mod config;
pub mod engine;
pub mod logging;
pub mod response;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::state::AppState;

pub async fn create_app(config: &Config) -> axum::Router {
    let store = store::connect(config.database_url.as_deref()).await;
    let catalog = Arc::new(seed::seed_catalog());
    tracing::info!(
        modules = catalog.modules().count(),
        questions = catalog.question_count(),
        "catalog seeded"
    );

    let state = AppState::new(store, catalog);

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
