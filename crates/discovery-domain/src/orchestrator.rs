//! Search Orchestrator (§4.9): runs the query pipeline stages in sequence,
//! hydrates result identifiers into full records from the relational
//! store, and preserves rank order.
//!
//! Grounded in `examples/original_source/backend/backend/logic/search.py`.

use crate::canonicalizer::Canonicalizer;
use crate::classifier::{QueryClass, QueryClassifier};
use crate::embedding_client::EmbeddingClient;
use crate::explanation::{ExplanationEngine, ScoredCompany};
use crate::extractor::FilterExtractor;
use crate::filters::{ExcludedFilterValue, QueryFilters};
use crate::llm_client::LlmClient;
use crate::merger;
use crate::model::{Company, ThesisContext};
use crate::repository::{CompanyRepository, UnknownExtractionLog, VocabularyRepository};
use crate::rewriter::QueryRewriter;
use crate::search_client::SearchClient;
use crate::thesis::ThesisExpander;
use crate::translator;
use discovery_core::PipelineMetrics;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// The companies document index name (§6 "Search engine document schema").
const COMPANIES_INDEX: &str = "companies";

pub struct SearchOutcome {
    pub results: Vec<(Company, Option<String>)>,
    pub applied_filters: QueryFilters,
    pub thesis_context: Option<ThesisContext>,
}

pub struct SearchOrchestrator {
    classifier: QueryClassifier,
    thesis_expander: ThesisExpander,
    extractor: FilterExtractor,
    rewriter: QueryRewriter,
    embedding: EmbeddingClient,
    search_client: SearchClient,
    explanation_engine: ExplanationEngine,
    company_repository: Arc<dyn CompanyRepository>,
    conceptual_expansion_enabled: bool,
    metrics: Option<PipelineMetrics>,
}

impl SearchOrchestrator {
    pub fn new(
        llm: LlmClient,
        search_client: SearchClient,
        embedding: EmbeddingClient,
        unknown_log: Arc<dyn UnknownExtractionLog>,
        vocabulary: Arc<dyn VocabularyRepository>,
        company_repository: Arc<dyn CompanyRepository>,
        explanation_engine: ExplanationEngine,
        conceptual_expansion_enabled: bool,
        metrics: Option<PipelineMetrics>,
    ) -> Self {
        let canonicalizer = Canonicalizer::new(search_client.clone(), metrics.clone());

        Self {
            classifier: QueryClassifier::new(llm.clone()),
            thesis_expander: ThesisExpander::new(llm.clone()),
            extractor: FilterExtractor::new(llm.clone(), canonicalizer, unknown_log, vocabulary, metrics.clone()),
            rewriter: QueryRewriter::new(llm),
            embedding,
            search_client,
            explanation_engine,
            company_repository,
            conceptual_expansion_enabled,
            metrics,
        }
    }

    /// `search(query, user-filters, excluded-values, size) → (ranked
    /// [(record, explanation)], applied-filters, thesis-context)`.
    ///
    /// Every auxiliary-model stage degrades to its documented neutral
    /// result; only the search engine and the relational store (the
    /// data-plane collaborators with no pipeline-internal fallback) can
    /// fail this call outright (§7 "the orchestrator itself propagates
    /// only unrecoverable errors").
    pub async fn search(
        &self,
        query: &str,
        user_filters: &QueryFilters,
        excluded_values: &[ExcludedFilterValue],
        size: usize,
    ) -> discovery_core::error::Result<SearchOutcome> {
        let original_query = query.to_string();
        let mut search_query = query.to_string();
        let mut thesis_context: Option<ThesisContext> = None;
        let mut is_thesis_path = false;

        if !query.trim().is_empty() {
            let classification = self.classifier.classify(query).await;
            if let Some(metrics) = &self.metrics {
                let label = match classification.class {
                    QueryClass::ExplicitSearch => "explicit_search",
                    QueryClass::PortfolioAnalysis => "portfolio_analysis",
                };
                metrics.classifications_total.with_label_values(&[label]).inc();
            }

            match classification.class {
                QueryClass::PortfolioAnalysis => {
                    if let Some(expansion) = self.thesis_expander.analyze_portfolio(query).await {
                        search_query = expansion.expanded_query;
                        thesis_context = Some(expansion.context);
                        is_thesis_path = true;
                    }
                }
                QueryClass::ExplicitSearch if classification.is_conceptual && self.conceptual_expansion_enabled => {
                    if let Some(expansion) = self.thesis_expander.expand_conceptual(query).await {
                        search_query = expansion.expanded_query;
                        thesis_context = Some(expansion.context);
                        is_thesis_path = true;
                    }
                }
                QueryClass::ExplicitSearch => {}
            }
        }

        let extracted_filters = self.extractor.extract(&search_query, excluded_values).await;
        let applied_filters = merger::merge(user_filters, &extracted_filters, excluded_values);

        if !is_thesis_path && !search_query.trim().is_empty() {
            search_query = self.rewriter.rewrite(&search_query, &applied_filters).await;
        }

        let query_vector = if search_query.trim().is_empty() {
            None
        } else {
            match self.embedding.embed(&search_query).await {
                Ok(vector) => Some(vector),
                Err(err) => {
                    warn!(error = %err, "search orchestrator: embedding call failed, falling back to filter-only search");
                    None
                }
            }
        };

        let engine_body = translator::to_search(&applied_filters, query_vector.as_deref(), size);
        let engine_response = self
            .search_client
            .search(COMPANIES_INDEX, &engine_body)
            .await
            .map_err(|err| discovery_core::Error::external_service(discovery_core::ErrorCode::SearchEngineError, err.to_string()))?;

        let ranked = parse_hits(&engine_response);
        let ids: Vec<i64> = ranked.iter().map(|(id, _)| *id).collect();

        let companies = self.company_repository.find_by_ids(&ids).await?;
        let scored = reorder_by_rank(&ranked, companies);

        let explanations = self
            .explanation_engine
            .explain_batch(&scored, &original_query, &applied_filters, thesis_context.as_ref())
            .await;

        let results = scored
            .into_iter()
            .map(|scored_company| {
                let explanation = explanations.get(&scored_company.company.id).cloned();
                (scored_company.company, explanation)
            })
            .collect();

        Ok(SearchOutcome { results, applied_filters, thesis_context })
    }
}

/// Extracts `(id, score)` pairs from an engine response's `hits.hits`, in
/// the engine's authoritative rank order (§4.9 step 9, §8 "preserves the
/// rank order of the engine response").
fn parse_hits(response: &Value) -> Vec<(i64, f64)> {
    response
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| {
                    let id = hit.get("_id").and_then(|v| v.as_str())?.parse::<i64>().ok()?;
                    let score = hit.get("_score").and_then(|v| v.as_f64()).unwrap_or(0.0);
                    Some((id, score))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Restores the engine's rank order against the (unordered) rows the
/// relational store returns, dropping any id the store doesn't have (§8
/// "each id in R appears at most once").
fn reorder_by_rank(ranked: &[(i64, f64)], companies: Vec<Company>) -> Vec<ScoredCompany> {
    ranked
        .iter()
        .filter_map(|(id, score)| {
            companies
                .iter()
                .find(|company| company.id == *id)
                .map(|company| ScoredCompany { company: company.clone(), score: *score })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_hits_preserves_engine_order() {
        let response = json!({
            "hits": {"hits": [
                {"_id": "3", "_score": 1.9},
                {"_id": "1", "_score": 1.2},
            ]}
        });
        let ranked = parse_hits(&response);
        assert_eq!(ranked, vec![(3, 1.9), (1, 1.2)]);
    }

    #[test]
    fn reorder_by_rank_drops_ids_not_hydrated() {
        let ranked = vec![(3, 1.9), (1, 1.2), (9, 0.5)];
        let companies = vec![
            Company {
                id: 1,
                company_name: "One".into(),
                description: None,
                website_url: None,
                employee_count: None,
                funding_amount: None,
                location: None,
                funding_stage: None,
                stage_order: None,
                industries: vec![],
                target_markets: vec![],
                business_models: vec![],
                revenue_models: vec![],
            },
            Company {
                id: 3,
                company_name: "Three".into(),
                description: None,
                website_url: None,
                employee_count: None,
                funding_amount: None,
                location: None,
                funding_stage: None,
                stage_order: None,
                industries: vec![],
                target_markets: vec![],
                business_models: vec![],
                revenue_models: vec![],
            },
        ];

        let scored = reorder_by_rank(&ranked, companies);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].company.id, 3);
        assert_eq!(scored[1].company.id, 1);
    }
}
