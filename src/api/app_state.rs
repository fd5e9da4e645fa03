use crate::observability::AppMetrics;
use crate::services::search::SearchService;
use std::sync::Arc;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Search orchestrator (schema store, result cache, dialect fallback)
    pub search_service: Arc<dyn SearchService>,
    /// Counters exposed on /metrics
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("search_service", &"Arc<dyn SearchService>")
            .field("endpoint", self.search_service.endpoint())
            .finish()
    }
}

impl AppState {
    pub fn new(search_service: Arc<dyn SearchService>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            search_service,
            metrics,
        }
    }
}
