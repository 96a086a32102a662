//! Segment Canonicalizer (§4.1): maps a raw extracted value onto the
//! segment vocabulary's canonical string(s) via fuzzy, multi-strategy
//! search-engine lookups with a composite quality floor.
//!
//! Grounded in `examples/original_source/backend/backend/es/fuzzy_matcher.py`.

use crate::search_client::SearchClient;
use crate::vocabulary::SegmentKind;
use discovery_core::PipelineMetrics;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::warn;

/// Up to this many candidates are pulled back from the engine per raw value
/// before the quality filter runs (§4.1 "Quality filter").
const MAX_CANDIDATES: usize = 50;

pub struct Canonicalizer {
    search: SearchClient,
    metrics: Option<PipelineMetrics>,
}

impl Canonicalizer {
    pub fn new(search: SearchClient, metrics: Option<PipelineMetrics>) -> Self {
        Self { search, metrics }
    }

    /// `canonicalize(segment, raw-value, threshold) → list of canonical
    /// strings, possibly empty`.
    pub async fn canonicalize(&self, kind: SegmentKind, raw_value: &str, threshold: f64) -> Vec<String> {
        let mut mapping = self.canonicalize_many(kind, std::slice::from_ref(&raw_value.to_string()), threshold).await;
        mapping.remove(raw_value).unwrap_or_default()
    }

    /// `canonicalize-many(segment, raw-values[], threshold) → mapping
    /// raw→list`. Non-fuzzy segments (funding-stage) return each input
    /// unchanged, matching §4.1's contract — the extractor validates these
    /// separately against the vocabulary table by exact case-insensitive
    /// match rather than through this fuzzy path.
    pub async fn canonicalize_many(
        &self,
        kind: SegmentKind,
        raw_values: &[String],
        threshold: f64,
    ) -> HashMap<String, Vec<String>> {
        if !kind.is_fuzzy() {
            return raw_values
                .iter()
                .map(|v| (v.clone(), vec![v.clone()]))
                .collect();
        }

        if let Some(metrics) = &self.metrics {
            metrics
                .canonicalization_requests_total
                .with_label_values(&[kind.as_segment().field_name()])
                .inc();
        }

        let index = format!("{}_vocabulary", kind.as_segment().field_name());
        let bodies: Vec<Value> = raw_values.iter().map(|v| build_query(v, kind)).collect();

        match self.search.multi_search(&index, &bodies).await {
            Ok(responses) => raw_values
                .iter()
                .zip(responses.iter())
                .map(|(raw, response)| (raw.clone(), extract_matches(raw, response, threshold)))
                .collect(),
            Err(err) => {
                // §4.1 "Failure modes": an unreachable engine never propagates as
                // an error — it surfaces as a logged warning and the caller sees
                // an empty mapping, so extraction just drops these rules.
                warn!(error = %err, segment = %kind.as_segment(), "segment canonicalizer: search engine unreachable");
                raw_values.iter().map(|v| (v.clone(), Vec::new())).collect()
            }
        }
    }
}

fn build_query(raw_value: &str, kind: SegmentKind) -> Value {
    let mut should: Vec<Value> = vec![
        json!({"term": {"name.keyword": {"value": raw_value, "boost": 4.0}}}),
        json!({"match_phrase_prefix": {"name": {"query": raw_value, "boost": 2.0}}}),
    ];

    let has_synonyms = matches!(
        kind,
        SegmentKind::Industries | SegmentKind::TargetMarkets | SegmentKind::BusinessModels | SegmentKind::RevenueModels
    );

    if has_synonyms {
        should.push(json!({"match": {"name.synonyms": {"query": raw_value, "operator": "and"}}}));
        should.push(json!({"match": {"name.synonyms": {"query": raw_value, "minimum_should_match": "75%"}}}));
    }

    should.push(json!({"fuzzy": {"name": {"value": raw_value, "fuzziness": "AUTO"}}}));

    if raw_value.chars().count() <= 5 {
        should.push(json!({"wildcard": {"name.keyword": {"value": format!("{}*", raw_value)}}}));
    }

    json!({
        "size": MAX_CANDIDATES,
        "query": {"bool": {"should": should, "minimum_should_match": 1}},
    })
}

/// Applies the quality filter described in §4.1 to one engine response and
/// returns the canonical names that pass.
fn extract_matches(raw_value: &str, response: &Value, threshold: f64) -> Vec<String> {
    let hits = response
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .cloned()
        .unwrap_or_default();

    let top_score = hits.first().and_then(|h| h.get("_score")).and_then(|s| s.as_f64()).unwrap_or(0.0);
    if top_score <= 0.0 {
        return Vec::new();
    }

    let query_tokens = tokenize(raw_value);
    let floor = quality_floor(raw_value, threshold);

    hits.into_iter()
        .filter_map(|hit| {
            let name = hit.get("_source").and_then(|s| s.get("name")).and_then(|n| n.as_str())?.to_string();
            let score = hit.get("_score").and_then(|s| s.as_f64()).unwrap_or(0.0);
            let normalized = score / top_score;
            let overlap = token_overlap(&query_tokens, &tokenize(&name));
            let quality = composite_quality(normalized, overlap);
            (quality >= floor).then_some(name)
        })
        .collect()
}

fn tokenize(s: &str) -> Vec<String> {
    s.to_lowercase().split_whitespace().map(str::to_string).collect()
}

fn token_overlap(query_tokens: &[String], candidate_tokens: &[String]) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let overlap = query_tokens.iter().filter(|t| candidate_tokens.contains(t)).count();
    overlap as f64 / query_tokens.len() as f64
}

fn composite_quality(normalized_score: f64, token_overlap: f64) -> f64 {
    0.7 * normalized_score + 0.3 * token_overlap
}

/// §4.1 "Accept candidate iff quality ≥ max(0.60, 0.8·threshold) for ≤3-char
/// queries, else quality ≥ threshold."
fn quality_floor(raw_value: &str, threshold: f64) -> f64 {
    if raw_value.chars().count() <= 3 {
        f64::max(0.60, 0.8 * threshold)
    } else {
        threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_quality_weights_score_over_overlap() {
        let quality = composite_quality(1.0, 0.0);
        assert!((quality - 0.7).abs() < 1e-9);
    }

    #[test]
    fn short_query_gets_stricter_floor() {
        assert!((quality_floor("AI", 0.5) - 0.60).abs() < 1e-9);
        assert!((quality_floor("AI", 0.9) - 0.72).abs() < 1e-9);
        assert!((quality_floor("Machine Learning", 0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn extract_matches_filters_low_quality_candidates() {
        let response = json!({
            "hits": {
                "hits": [
                    {"_score": 10.0, "_source": {"name": "AI & Machine Learning"}},
                    {"_score": 1.0, "_source": {"name": "Aid Distribution"}},
                ]
            }
        });
        let matches = extract_matches("AI", &response, 0.6);
        assert_eq!(matches, vec!["AI & Machine Learning".to_string()]);
    }

    #[test]
    fn empty_hits_yield_empty_matches() {
        let response = json!({"hits": {"hits": []}});
        assert!(extract_matches("anything", &response, 0.5).is_empty());
    }

    #[tokio::test]
    async fn non_fuzzy_segment_returns_input_unchanged() {
        use discovery_core::config::SearchEngineConfig;

        let search = SearchClient::new(&SearchEngineConfig {
            url: "http://localhost:9999".into(),
            api_key: None,
            timeout_ms: 100,
        });
        let canonicalizer = Canonicalizer::new(search, None);
        let raw = vec!["Series A".to_string()];
        let mapping = canonicalizer.canonicalize_many(SegmentKind::FundingStage, &raw, 0.5).await;
        assert_eq!(mapping.get("Series A"), Some(&vec!["Series A".to_string()]));
    }
}
