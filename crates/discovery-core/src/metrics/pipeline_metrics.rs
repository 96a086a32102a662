use prometheus::{HistogramVec, IntCounterVec, Opts};

/// Query-pipeline metrics: request outcomes, per-stage fallback counts, and
/// the explanation cache's hit/miss/eviction counters required by the
/// concurrency model (§5) and the explanation engine (§4.8.2).
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    /// Total submitted queries, labeled by outcome ("ok", "client_error", "server_error").
    pub requests_total: IntCounterVec,
    /// End-to-end orchestrator latency.
    pub request_duration_seconds: HistogramVec,

    /// Query classifications, labeled by resulting class.
    pub classifications_total: IntCounterVec,
    /// Times a pipeline stage fell back to its documented neutral result,
    /// labeled by stage name ("classifier", "thesis_expander", "extractor",
    /// "rewriter", "explainer").
    pub stage_fallbacks_total: IntCounterVec,

    /// Explanation cache hit/miss/eviction counters (§4.8.2).
    pub explanation_cache_hits_total: IntCounterVec,
    pub explanation_cache_misses_total: IntCounterVec,
    pub explanation_cache_evictions_total: IntCounterVec,

    /// Canonicalization round trips against the search engine's vocabulary indices.
    pub canonicalization_requests_total: IntCounterVec,
    /// Unknown-extraction entries recorded (vocabulary misses, §6).
    pub unknown_extractions_total: IntCounterVec,
}

impl PipelineMetrics {
    pub fn new(namespace: &str) -> Result<Self, prometheus::Error> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                format!("{}_requests_total", namespace),
                "Total number of submit-query requests",
            ),
            &["outcome"],
        )?;

        let request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                format!("{}_request_duration_seconds", namespace),
                "Time spent serving a submit-query request",
            )
            .buckets(vec![
                0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["outcome"],
        )?;

        let classifications_total = IntCounterVec::new(
            Opts::new(
                format!("{}_classifications_total", namespace),
                "Query classifications by resulting class",
            ),
            &["class"],
        )?;

        let stage_fallbacks_total = IntCounterVec::new(
            Opts::new(
                format!("{}_stage_fallbacks_total", namespace),
                "Pipeline stage fallbacks to the documented neutral result",
            ),
            &["stage"],
        )?;

        let explanation_cache_hits_total = IntCounterVec::new(
            Opts::new(
                format!("{}_explanation_cache_hits_total", namespace),
                "Explanation cache hits",
            ),
            &[],
        )?;

        let explanation_cache_misses_total = IntCounterVec::new(
            Opts::new(
                format!("{}_explanation_cache_misses_total", namespace),
                "Explanation cache misses",
            ),
            &[],
        )?;

        let explanation_cache_evictions_total = IntCounterVec::new(
            Opts::new(
                format!("{}_explanation_cache_evictions_total", namespace),
                "Explanation cache LRU evictions",
            ),
            &[],
        )?;

        let canonicalization_requests_total = IntCounterVec::new(
            Opts::new(
                format!("{}_canonicalization_requests_total", namespace),
                "Segment canonicalizer round trips to the search engine",
            ),
            &["segment"],
        )?;

        let unknown_extractions_total = IntCounterVec::new(
            Opts::new(
                format!("{}_unknown_extractions_total", namespace),
                "Vocabulary misses recorded to the unknown-extraction log",
            ),
            &["segment"],
        )?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            classifications_total,
            stage_fallbacks_total,
            explanation_cache_hits_total,
            explanation_cache_misses_total,
            explanation_cache_evictions_total,
            canonicalization_requests_total,
            unknown_extractions_total,
        })
    }

    pub fn register_all(&self, registry: &super::MetricsRegistry) -> Result<(), prometheus::Error> {
        registry.register(self.requests_total.clone())?;
        registry.register(self.request_duration_seconds.clone())?;
        registry.register(self.classifications_total.clone())?;
        registry.register(self.stage_fallbacks_total.clone())?;
        registry.register(self.explanation_cache_hits_total.clone())?;
        registry.register(self.explanation_cache_misses_total.clone())?;
        registry.register(self.explanation_cache_evictions_total.clone())?;
        registry.register(self.canonicalization_requests_total.clone())?;
        registry.register(self.unknown_extractions_total.clone())?;
        Ok(())
    }
}
