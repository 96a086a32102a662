//! Filter Extractor (§4.4): drives the language model to produce a
//! structured filter object from the query, then canonicalizes each value
//! via the Segment Canonicalizer; tracks unknowns.
//!
//! Grounded in `examples/original_source/backend/backend/llm/query_extractor.py`
//! (via `_INDEX.md`) and the sibling extraction helpers in
//! `.../logic/filter_merger.py`.

use crate::canonicalizer::Canonicalizer;
use crate::filters::{ExcludedFilterValue, FilterValue, Logic, Operator, QueryFilters, Rule, Segment, SegmentFilter};
use crate::llm_client::LlmClient;
use crate::repository::{UnknownExtractionLog, VocabularyRepository};
use crate::vocabulary::SegmentKind;
use discovery_core::PipelineMetrics;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Fixed quality threshold passed to the canonicalizer for every
/// extraction-time lookup. The spec leaves per-call thresholds to the
/// caller; extraction always uses the same value so the extractor's
/// behavior is deterministic given the vocabulary snapshot.
const EXTRACTION_QUALITY_THRESHOLD: f64 = 0.65;

const SYSTEM_PROMPT: &str = "Extract a structured filter object from the user's company-search query. \
    Respond as a JSON object with keys `logic` (\"AND\" or \"OR\") and `segments` (array). Each segment has \
    `segment` (one of location, industries, target_markets, funding_stage, business_models, revenue_models, \
    employee_count, funding_amount, stage_order), `logic` (\"AND\" or \"OR\"), and `rules` (array of \
    {\"operator\": one of EQ/NEQ/GT/GTE/LT/LTE, \"value\": string or number}). Omit segments the query does \
    not constrain.";

pub struct FilterExtractor {
    llm: LlmClient,
    canonicalizer: Canonicalizer,
    unknown_log: Arc<dyn UnknownExtractionLog>,
    vocabulary: Arc<dyn VocabularyRepository>,
    metrics: Option<PipelineMetrics>,
}

impl FilterExtractor {
    pub fn new(
        llm: LlmClient,
        canonicalizer: Canonicalizer,
        unknown_log: Arc<dyn UnknownExtractionLog>,
        vocabulary: Arc<dyn VocabularyRepository>,
        metrics: Option<PipelineMetrics>,
    ) -> Self {
        Self { llm, canonicalizer, unknown_log, vocabulary, metrics }
    }

    /// `extract(query, excluded-values) → QueryFilters`. Any exception in
    /// the language-model call or the pre-validation scrub (steps 1-2)
    /// yields an empty `(AND, [])` result — the search proceeds with user
    /// filters alone (§4.4 "Failure semantics").
    pub async fn extract(&self, query: &str, excluded_values: &[ExcludedFilterValue]) -> QueryFilters {
        let raw = match self.llm.complete_json(SYSTEM_PROMPT, query).await {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "filter extractor: language model call failed");
                return QueryFilters::empty();
            }
        };

        let scrubbed = scrub_logic_fields(raw);
        let parsed: QueryFilters = match serde_json::from_value(scrubbed) {
            Ok(filters) => filters,
            Err(err) => {
                warn!(error = %err, "filter extractor: model response violated the filter schema");
                return QueryFilters::empty();
            }
        };

        let mut segments = Vec::with_capacity(parsed.segments.len());
        for segment_filter in &parsed.segments {
            if let Some(canonicalized) = self.canonicalize_segment(segment_filter).await {
                segments.push(canonicalized);
            }
        }

        apply_saas_expansion(&mut segments);
        apply_exclusions(&mut segments, excluded_values);
        segments.retain(|segment_filter| !segment_filter.is_empty());

        QueryFilters { logic: parsed.logic, segments }
    }

    /// Validates/canonicalizes one extracted `SegmentFilter`. Numeric
    /// segments pass through unchanged (no vocabulary to check against).
    /// `FundingStage` validates each value by case-insensitive exact match
    /// (§4.1 "non-fuzzy segments"); every other text segment is
    /// batch-canonicalized in one search-engine round trip (§4.4 step 3).
    async fn canonicalize_segment(&self, segment_filter: &SegmentFilter) -> Option<SegmentFilter> {
        let segment = segment_filter.segment;

        let Some(kind) = SegmentKind::from_segment(segment) else {
            return Some(segment_filter.clone());
        };

        if kind == SegmentKind::FundingStage {
            return self.canonicalize_funding_stage(segment_filter).await;
        }

        let raw_values: Vec<String> = segment_filter
            .rules
            .iter()
            .filter_map(|rule| rule.value.as_text().map(str::to_string))
            .collect();

        let mapping = self
            .canonicalizer
            .canonicalize_many(kind, &raw_values, EXTRACTION_QUALITY_THRESHOLD)
            .await;

        let mut rules = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for rule in &segment_filter.rules {
            let Some(raw) = rule.value.as_text() else { continue };
            let canonical_values = mapping.get(raw).cloned().unwrap_or_default();

            if canonical_values.is_empty() {
                self.record_unknown(raw, kind).await;
                continue;
            }

            for canonical in canonical_values {
                if seen.insert(canonical.clone()) {
                    rules.push(Rule::new(rule.operator, FilterValue::Text(canonical)));
                }
            }
        }

        Some(SegmentFilter::new(segment, segment_filter.logic, rules))
    }

    async fn canonicalize_funding_stage(&self, segment_filter: &SegmentFilter) -> Option<SegmentFilter> {
        let vocabulary = self.vocabulary.list(SegmentKind::FundingStage).await.unwrap_or_default();

        let rules: Vec<Rule> = segment_filter
            .rules
            .iter()
            .filter_map(|rule| {
                let raw = rule.value.as_text()?;
                vocabulary
                    .iter()
                    .find(|entry| entry.name.eq_ignore_ascii_case(raw))
                    .map(|entry| Rule::new(rule.operator, FilterValue::Text(entry.name.clone())))
            })
            .collect();

        Some(SegmentFilter::new(segment_filter.segment, segment_filter.logic, rules))
    }

    async fn record_unknown(&self, raw_value: &str, kind: SegmentKind) {
        if let Some(metrics) = &self.metrics {
            metrics
                .unknown_extractions_total
                .with_label_values(&[kind.as_segment().field_name()])
                .inc();
        }
        if let Err(err) = self.unknown_log.record(raw_value, kind).await {
            warn!(error = %err, raw_value, "filter extractor: failed to record unknown-extraction entry");
        }
    }
}

/// Pre-Pydantic-validation scrub (§4.4 step 2): overwrites a segment's
/// `logic` field with `"AND"` whenever the model has put something other
/// than "AND"/"OR" there — the common failure mode being an operator token
/// (e.g. `"EQ"`) leaking into the slot.
fn scrub_logic_fields(mut raw: Value) -> Value {
    if let Some(segments) = raw.get_mut("segments").and_then(|s| s.as_array_mut()) {
        for segment in segments.iter_mut() {
            let is_valid_logic = segment
                .get("logic")
                .and_then(|v| v.as_str())
                .map(|s| s.eq_ignore_ascii_case("and") || s.eq_ignore_ascii_case("or"))
                .unwrap_or(false);

            if !is_valid_logic {
                if let Some(obj) = segment.as_object_mut() {
                    obj.insert("logic".to_string(), Value::String("AND".to_string()));
                }
            }
        }
    }
    raw
}

/// Domain expansion rule (§4.4 step 4): if business-models contains
/// "Vertical SaaS" or "Horizontal SaaS" but not "SaaS", append a rule
/// matching the parent category. Grounded in the observation that a
/// seeded vocabulary always treats SaaS as a superset of its two
/// sub-categories.
fn apply_saas_expansion(segments: &mut [SegmentFilter]) {
    for segment_filter in segments.iter_mut() {
        if segment_filter.segment != Segment::BusinessModels {
            continue;
        }

        let values: Vec<&str> = segment_filter.rules.iter().filter_map(|r| r.value.as_text()).collect();
        let has_child = values.contains(&"Vertical SaaS") || values.contains(&"Horizontal SaaS");
        let has_saas = values.contains(&"SaaS");

        if has_child && !has_saas {
            segment_filter.rules.push(Rule::new(Operator::Eq, FilterValue::Text("SaaS".to_string())));
        }
    }
}

/// §4.4 step 5: drops any rule whose `(segment, operator, value)` triple
/// appears in `excluded_values`.
fn apply_exclusions(segments: &mut Vec<SegmentFilter>, excluded_values: &[ExcludedFilterValue]) {
    for segment_filter in segments.iter_mut() {
        segment_filter
            .rules
            .retain(|rule| !excluded_values.iter().any(|excluded| excluded.matches(segment_filter.segment, rule)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scrub_overwrites_non_and_or_logic_with_and() {
        let raw = json!({
            "logic": "AND",
            "segments": [
                {"segment": "industries", "logic": "EQ", "rules": []},
                {"segment": "location", "logic": "or", "rules": []},
            ]
        });
        let scrubbed = scrub_logic_fields(raw);
        assert_eq!(scrubbed["segments"][0]["logic"], "AND");
        assert_eq!(scrubbed["segments"][1]["logic"], "or");
    }

    #[test]
    fn saas_expansion_appends_parent_category_once() {
        let mut segments = vec![SegmentFilter::new(
            Segment::BusinessModels,
            Logic::Or,
            vec![Rule::new(Operator::Eq, FilterValue::Text("Vertical SaaS".to_string()))],
        )];
        apply_saas_expansion(&mut segments);
        let values: Vec<&str> = segments[0].rules.iter().filter_map(|r| r.value.as_text()).collect();
        assert!(values.contains(&"SaaS"));
        assert_eq!(values.iter().filter(|v| **v == "SaaS").count(), 1);
    }

    #[test]
    fn saas_expansion_is_noop_when_saas_already_present() {
        let mut segments = vec![SegmentFilter::new(
            Segment::BusinessModels,
            Logic::Or,
            vec![
                Rule::new(Operator::Eq, FilterValue::Text("Vertical SaaS".to_string())),
                Rule::new(Operator::Eq, FilterValue::Text("SaaS".to_string())),
            ],
        )];
        apply_saas_expansion(&mut segments);
        let count = segments[0].rules.iter().filter(|r| r.value.as_text() == Some("SaaS")).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn exclusions_drop_matching_triples() {
        let mut segments = vec![SegmentFilter::new(
            Segment::Industries,
            Logic::Or,
            vec![Rule::new(Operator::Eq, FilterValue::Text("FinTech".to_string()))],
        )];
        let excluded = vec![ExcludedFilterValue {
            segment: Segment::Industries,
            operator: Operator::Eq,
            value: FilterValue::Text("FinTech".to_string()),
        }];
        apply_exclusions(&mut segments, &excluded);
        assert!(segments[0].rules.is_empty());
    }
}
