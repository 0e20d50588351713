use std::sync::Arc;
use std::time::Instant;

use mathdrill_algo::AdaptationConfig;

use crate::catalog::Catalog;
use crate::store::DrillStore;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    store: Arc<dyn DrillStore>,
    catalog: Arc<Catalog>,
    adaptation: AdaptationConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn DrillStore>, catalog: Arc<Catalog>) -> Self {
        Self {
            started_at: Instant::now(),
            store,
            catalog,
            adaptation: AdaptationConfig::default(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn store(&self) -> &dyn DrillStore {
        self.store.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn adaptation(&self) -> &AdaptationConfig {
        &self.adaptation
    }
}
