use discovery_core::{Config, DatabasePool, MetricsRegistry, PipelineMetrics};
use discovery_domain::{SearchOrchestrator, VocabularyRepository};
use std::sync::Arc;

/// Shared application state: configuration, the relational pool, the
/// Prometheus registry, and the assembled query pipeline. There is no
/// per-tenant or per-user concept here — a single `SearchOrchestrator`
/// serves every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DatabasePool,
    pub metrics: MetricsRegistry,
    pub pipeline_metrics: Option<PipelineMetrics>,
    pub orchestrator: Arc<SearchOrchestrator>,
    pub vocabulary_repository: Arc<dyn VocabularyRepository>,
}
