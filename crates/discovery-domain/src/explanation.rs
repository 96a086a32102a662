//! Explanation Engine (§4.8): produces per-result rationales, batches
//! language-model calls, and caches results by `(result-id,
//! normalized-query)` behind an LRU+TTL cache (§4.8.2).
//!
//! Grounded in
//! `examples/original_source/backend/backend/llm/explanation_generator.py`,
//! `.../llm/explanation_cache.py`, and `.../logic/explainer.py`.

use crate::filters::QueryFilters;
use crate::llm_client::LlmClient;
use crate::model::{Company, ThesisContext};
use crate::rewriter::describe_filters;
use discovery_core::PipelineMetrics;
use lru::LruCache;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

/// One engine hit paired with its rank-order score, as handed off from the
/// orchestrator's translate/search step. The score is expected in the
/// `[0,2]` script-score range when a query vector was used, or `[0,1]` when
/// the result came from a pure-kNN or filter-only query (§9 Open Question
/// iii) — [`relevance_band`] accepts both.
#[derive(Debug, Clone)]
pub struct ScoredCompany {
    pub company: Company,
    pub score: f64,
}

const SYSTEM_PROMPT: &str = "For each company below, write a one- or two-sentence explanation of why it \
    matches the user's search query and filters. Respond as a JSON array of objects, each with \
    `company_id` and `explanation`.";

/// §4.8.2 defaults: capacity 1000, TTL one hour.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

struct CacheEntry {
    explanation: String,
    inserted_at: Instant,
}

/// LRU-with-per-entry-TTL cache keyed by `(result-id, normalized-query-hash)`.
/// Eviction is least-recently-used on insertion overflow; expiry is checked
/// per lookup. Hit/miss/eviction counts are exposed both via internal
/// counters (for unit tests) and, when configured, via Prometheus.
pub struct ExplanationCache {
    inner: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    metrics: Option<PipelineMetrics>,
}

impl ExplanationCache {
    pub fn new(capacity: usize, ttl: Duration, metrics: Option<PipelineMetrics>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap());
        Self { inner: Mutex::new(LruCache::new(capacity)), ttl, metrics }
    }

    fn key(result_id: i64, normalized_query_hash: &str) -> String {
        format!("{result_id}:{normalized_query_hash}")
    }

    fn get(&self, result_id: i64, normalized_query_hash: &str) -> Option<String> {
        let key = Self::key(result_id, normalized_query_hash);
        let mut cache = self.inner.lock().expect("explanation cache mutex poisoned");

        match cache.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                let explanation = entry.explanation.clone();
                if let Some(metrics) = &self.metrics {
                    metrics.explanation_cache_hits_total.with_label_values(&[]).inc();
                }
                Some(explanation)
            }
            Some(_) => {
                cache.pop(&key);
                if let Some(metrics) = &self.metrics {
                    metrics.explanation_cache_misses_total.with_label_values(&[]).inc();
                }
                None
            }
            None => {
                if let Some(metrics) = &self.metrics {
                    metrics.explanation_cache_misses_total.with_label_values(&[]).inc();
                }
                None
            }
        }
    }

    fn insert(&self, result_id: i64, normalized_query_hash: &str, explanation: String) {
        let key = Self::key(result_id, normalized_query_hash);
        let mut cache = self.inner.lock().expect("explanation cache mutex poisoned");

        let is_new_key = !cache.contains(&key);
        let was_full = cache.len() == cache.cap().get();

        cache.put(key, CacheEntry { explanation, inserted_at: Instant::now() });

        if is_new_key && was_full {
            if let Some(metrics) = &self.metrics {
                metrics.explanation_cache_evictions_total.with_label_values(&[]).inc();
            }
        }
    }
}

/// Normalizes a query for cache keying: lowercase, strip non-alphanumerics
/// to single spaces, sort tokens, hash with MD5 (§4.8.2). Invariant under
/// case, punctuation, whitespace, and token order (§8 "Round-trips").
pub fn normalize_query_key(query: &str) -> String {
    let mut tokens: Vec<String> = query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    tokens.sort();
    let normalized = tokens.join(" ");
    format!("{:x}", md5::compute(normalized.as_bytes()))
}

pub struct ExplanationEngine {
    llm: LlmClient,
    cache: ExplanationCache,
    cache_enabled: bool,
}

impl ExplanationEngine {
    pub fn new(llm: LlmClient, cache: ExplanationCache, cache_enabled: bool) -> Self {
        Self { llm, cache, cache_enabled }
    }

    /// `explain-batch(results[], query, applied-filters) → mapping
    /// id→explanation`. Guarantees one explanation per result id,
    /// order-independent (§8 "domain(explanations) = ids(R)").
    pub async fn explain_batch(
        &self,
        results: &[ScoredCompany],
        query: &str,
        applied_filters: &QueryFilters,
        thesis_context: Option<&ThesisContext>,
    ) -> HashMap<i64, String> {
        let query_hash = normalize_query_key(query);
        let mut explanations = HashMap::new();
        let mut misses = Vec::new();

        for result in results {
            if self.cache_enabled {
                if let Some(cached) = self.cache.get(result.company.id, &query_hash) {
                    explanations.insert(result.company.id, cached);
                    continue;
                }
            }
            misses.push(result);
        }

        if misses.is_empty() {
            return explanations;
        }

        let filters_summary = describe_filters(applied_filters);
        let prompt = build_prompt(&misses, query, &filters_summary);

        match self.llm.complete_json(SYSTEM_PROMPT, &prompt).await {
            Ok(value) => {
                for (company_id, explanation) in parse_explanations(&value) {
                    if self.cache_enabled {
                        self.cache.insert(company_id, &query_hash, explanation.clone());
                    }
                    explanations.insert(company_id, explanation);
                }
            }
            Err(err) => {
                warn!(error = %err, "explanation engine: language model call failed, falling back to rule-based explanations");
            }
        }

        for result in misses {
            explanations.entry(result.company.id).or_insert_with(|| {
                rule_based_explanation(result, applied_filters, thesis_context)
            });
        }

        explanations
    }
}

fn build_prompt(misses: &[&ScoredCompany], query: &str, filters_summary: &str) -> String {
    let records: Vec<Value> = misses
        .iter()
        .map(|result| {
            let company = &result.company;
            json!({
                "id": company.id,
                "name": company.company_name,
                "description": company.description,
                "industries": company.industries,
                "target_markets": company.target_markets,
                "business_models": company.business_models,
                "revenue_models": company.revenue_models,
                "location": company.location,
                "stage": company.funding_stage,
                "funding_amount": company.funding_amount,
                "employee_count": company.employee_count,
            })
        })
        .collect();

    format!(
        "Query: {}\nApplied filters: {}\nCompanies: {}",
        query,
        filters_summary,
        serde_json::to_string(&records).unwrap_or_default()
    )
}

/// Tolerates three response shapes (§4.8 step 4): a top-level array, an
/// object with an `explanations` or `companies` key, or a single object
/// (wrapped into a one-element list). Items missing either `company_id` or
/// `explanation` are ignored.
fn parse_explanations(value: &Value) -> Vec<(i64, String)> {
    let items: Vec<&Value> = if let Some(array) = value.as_array() {
        array.iter().collect()
    } else if let Some(array) = value.get("explanations").and_then(|v| v.as_array()) {
        array.iter().collect()
    } else if let Some(array) = value.get("companies").and_then(|v| v.as_array()) {
        array.iter().collect()
    } else if value.is_object() {
        vec![value]
    } else {
        Vec::new()
    };

    items
        .into_iter()
        .filter_map(|item| {
            let id = item.get("company_id").and_then(|v| v.as_i64())?;
            let explanation = item.get("explanation").and_then(|v| v.as_str())?.to_string();
            Some((id, explanation))
        })
        .collect()
}

/// §4.8.1 rule-based fallback: a per-filter match description plus a
/// coarse semantic-relevance band, with an optional strategic-fit sentence
/// prepended for thesis queries.
fn rule_based_explanation(result: &ScoredCompany, applied_filters: &QueryFilters, thesis_context: Option<&ThesisContext>) -> String {
    let mut sentence = String::new();

    if let Some(strategic_fit) = strategic_fit_sentence(thesis_context) {
        sentence.push_str(&strategic_fit);
        sentence.push(' ');
    }

    if applied_filters.segments.is_empty() {
        sentence.push_str(&format!("Matches the query with {} semantic relevance.", relevance_band(result.score)));
    } else {
        sentence.push_str(&format!(
            "Matches on {}, with {} semantic relevance.",
            describe_filters(applied_filters),
            relevance_band(result.score)
        ));
    }

    sentence
}

/// Normalizes a raw engine score back to `[0,1]` by subtracting the
/// script-score vector shift when the input looks like it's in `[0,2]`
/// (§9 Open Question iii: must accept both ranges).
fn relevance_band(raw_score: f64) -> &'static str {
    let normalized = if raw_score > 1.0 { raw_score - 1.0 } else { raw_score };
    let clamped = normalized.clamp(0.0, 1.0);

    if clamped >= 0.75 {
        "high"
    } else if clamped >= 0.35 {
        "good"
    } else {
        "some"
    }
}

fn strategic_fit_sentence(thesis_context: Option<&ThesisContext>) -> Option<String> {
    match thesis_context? {
        ThesisContext::Portfolio { complementary_areas, .. } => {
            complementary_areas.first().map(|area| format!("Complements the portfolio's gap in {area}."))
        }
        ThesisContext::Conceptual { core_concepts, .. } => {
            let concept = core_concepts
                .industries
                .first()
                .or_else(|| core_concepts.technology.first())
                .or_else(|| core_concepts.business_model.first());
            concept.map(|concept| format!("Aligns with the thesis' focus on {concept}."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_query_key_is_invariant_under_case_punctuation_and_order() {
        let a = normalize_query_key("AI companies, in SF!");
        let b = normalize_query_key("sf in ai companies");
        assert_eq!(a, b);
    }

    #[test]
    fn relevance_band_accepts_both_0_2_and_0_1_ranges() {
        assert_eq!(relevance_band(1.9), "high");
        assert_eq!(relevance_band(0.9), "high");
        assert_eq!(relevance_band(1.35), "good");
        assert_eq!(relevance_band(0.1), "some");
    }

    #[test]
    fn parse_explanations_handles_top_level_array() {
        let value = json!([{"company_id": 1, "explanation": "e1"}]);
        let parsed = parse_explanations(&value);
        assert_eq!(parsed, vec![(1, "e1".to_string())]);
    }

    #[test]
    fn parse_explanations_handles_wrapped_object_shapes() {
        let value = json!({"explanations": [{"company_id": 2, "explanation": "e2"}]});
        assert_eq!(parse_explanations(&value), vec![(2, "e2".to_string())]);

        let value = json!({"companies": [{"company_id": 3, "explanation": "e3"}]});
        assert_eq!(parse_explanations(&value), vec![(3, "e3".to_string())]);
    }

    #[test]
    fn parse_explanations_wraps_single_object() {
        let value = json!({"company_id": 4, "explanation": "e4"});
        assert_eq!(parse_explanations(&value), vec![(4, "e4".to_string())]);
    }

    #[test]
    fn parse_explanations_ignores_items_missing_fields() {
        let value = json!([{"company_id": 1}, {"explanation": "no id"}]);
        assert!(parse_explanations(&value).is_empty());
    }

    #[test]
    fn cache_hit_then_eviction_on_overflow() {
        let cache = ExplanationCache::new(1, Duration::from_secs(3600), None);
        cache.insert(1, "hash", "first".to_string());
        assert_eq!(cache.get(1, "hash"), Some("first".to_string()));

        cache.insert(2, "hash", "second".to_string());
        assert_eq!(cache.get(1, "hash"), None);
        assert_eq!(cache.get(2, "hash"), Some("second".to_string()));
    }

    #[test]
    fn expired_entry_is_treated_as_a_miss() {
        let cache = ExplanationCache::new(10, Duration::from_millis(1), None);
        cache.insert(1, "hash", "stale".to_string());
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get(1, "hash"), None);
    }
}
