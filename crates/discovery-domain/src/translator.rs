//! Search Translator (§4.7): converts the filter DSL and an optional query
//! vector into a hybrid predicate+kNN query for the search engine.
//!
//! Grounded in `examples/original_source/backend/backend/es/filter_converter.py`;
//! the query-builder idiom follows `crates/master-data/src/customer/search.rs`'s
//! `AdvancedSearchFilters` translation into SQL predicates, adapted here to
//! build JSON query bodies instead.

use crate::filters::{FilterValue, Logic, Operator, QueryFilters, Segment, SegmentFilter};
use serde_json::{json, Value};

/// `cosineSimilarity(...) + 1.0` keeps scores non-negative for engine
/// correctness (§4.7 point 2); the explanation engine's rule-based fallback
/// subtracts the shift back out (§4.8.1, §9 Open Question iii).
const SCRIPT_SCORE_VECTOR_SHIFT: f64 = 1.0;

/// `to-search(filters, optional-query-vector) → engine-query`. `size` bounds
/// both the filter-only and match-all shapes; for the vector shapes, `k =
/// size` and `num_candidates = 10 * size` (§4.7 point 3).
pub fn to_search(filters: &QueryFilters, query_vector: Option<&[f32]>, size: usize) -> Value {
    let predicate = build_predicate(filters);

    match (predicate, query_vector) {
        (Some(predicate), Some(vector)) => json!({
            "size": size,
            "query": {
                "script_score": {
                    "query": predicate,
                    "script": {
                        "source": "cosineSimilarity(params.query_vector, 'description_vector') + params.shift",
                        "params": {"query_vector": vector, "shift": SCRIPT_SCORE_VECTOR_SHIFT},
                    },
                },
            },
        }),
        (Some(predicate), None) => json!({
            "size": size,
            "query": predicate,
        }),
        (None, Some(vector)) => json!({
            "size": size,
            "knn": {
                "field": "description_vector",
                "query_vector": vector,
                "k": size,
                "num_candidates": size * 10,
            },
        }),
        (None, None) => json!({
            "size": size,
            "query": {"match_all": {}},
        }),
    }
}

/// Builds the boolean predicate tree for `filters`, or `None` when there are
/// no segment filters at all (§4.7 point 4 "Neither" / point 1's
/// single-clause shortcuts apply within each segment too).
fn build_predicate(filters: &QueryFilters) -> Option<Value> {
    if filters.segments.is_empty() {
        return None;
    }

    let clauses: Vec<Value> = filters.segments.iter().map(build_segment_clause).collect();

    if clauses.len() == 1 {
        return Some(clauses.into_iter().next().unwrap());
    }

    Some(combine(clauses, filters.logic))
}

/// Converts one `SegmentFilter`'s rules into a single clause, combined by
/// the segment's own `logic` (§4.7 "Intra-segment logic"). A single-rule
/// segment is returned unwrapped, per the "single-rule shortcut".
fn build_segment_clause(segment_filter: &SegmentFilter) -> Value {
    let clauses: Vec<Value> = segment_filter.rules.iter().map(|rule| build_rule_clause(segment_filter.segment, rule)).collect();

    if clauses.len() == 1 {
        clauses.into_iter().next().unwrap()
    } else {
        combine(clauses, segment_filter.logic)
    }
}

fn combine(clauses: Vec<Value>, logic: Logic) -> Value {
    match logic {
        Logic::And => json!({"bool": {"must": clauses}}),
        Logic::Or => json!({"bool": {"should": clauses, "minimum_should_match": 1}}),
    }
}

/// Converts one `Rule` into its engine clause: text `EQ`/`NEQ` are
/// term/must-not(term); numeric `EQ`/`NEQ` are term/must-not(term);
/// ordering operators are `range` with open/closed bounds preserved (§4.7
/// point 1, §8 "Round-trips").
fn build_rule_clause(segment: Segment, rule: &crate::filters::Rule) -> Value {
    let field = segment.field_name();
    let value = value_json(&rule.value);

    match rule.operator {
        Operator::Eq => json!({"term": {field: value}}),
        Operator::Neq => json!({"bool": {"must_not": [{"term": {field: value}}]}}),
        Operator::Gt => json!({"range": {field: {"gt": value}}}),
        Operator::Gte => json!({"range": {field: {"gte": value}}}),
        Operator::Lt => json!({"range": {field: {"lt": value}}}),
        Operator::Lte => json!({"range": {field: {"lte": value}}}),
    }
}

fn value_json(value: &FilterValue) -> Value {
    match value {
        FilterValue::Text(s) => json!(s),
        FilterValue::Number(n) => json!(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Rule;

    fn single_rule_filter(segment: Segment, operator: Operator, value: FilterValue) -> QueryFilters {
        QueryFilters {
            logic: Logic::And,
            segments: vec![SegmentFilter::new(segment, Logic::And, vec![Rule::new(operator, value)])],
        }
    }

    #[test]
    fn neither_filters_nor_vector_is_match_all() {
        let query = to_search(&QueryFilters::empty(), None, 20);
        assert_eq!(query["query"], json!({"match_all": {}}));
    }

    #[test]
    fn vector_only_is_pure_knn_with_10x_candidates() {
        let vector = vec![0.1_f32, 0.2, 0.3];
        let query = to_search(&QueryFilters::empty(), Some(&vector), 20);
        assert_eq!(query["knn"]["k"], 20);
        assert_eq!(query["knn"]["num_candidates"], 200);
        assert!(query.get("query").is_none());
    }

    #[test]
    fn filters_without_vector_has_no_script_score_wrapper() {
        let filters = single_rule_filter(Segment::Location, Operator::Eq, FilterValue::Text("SF".to_string()));
        let query = to_search(&filters, None, 20);
        assert!(query["query"].get("script_score").is_none());
        assert_eq!(query["query"], json!({"term": {"location": "SF"}}));
    }

    #[test]
    fn single_segment_single_rule_has_no_bool_wrapper() {
        let filters = single_rule_filter(Segment::Location, Operator::Eq, FilterValue::Text("SF".to_string()));
        let query = to_search(&filters, None, 20);
        assert!(query["query"].get("bool").is_none());
    }

    #[test]
    fn multiple_segments_combine_under_top_level_logic() {
        let mut filters = single_rule_filter(Segment::Location, Operator::Eq, FilterValue::Text("SF".to_string()));
        filters.segments.push(SegmentFilter::new(
            Segment::Industries,
            Logic::Or,
            vec![Rule::new(Operator::Eq, FilterValue::Text("FinTech".to_string()))],
        ));
        filters.logic = Logic::And;

        let query = to_search(&filters, None, 20);
        assert!(query["query"]["bool"]["must"].is_array());
        assert_eq!(query["query"]["bool"]["must"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn filters_plus_vector_wraps_predicate_in_script_score() {
        let filters = single_rule_filter(Segment::Location, Operator::Eq, FilterValue::Text("SF".to_string()));
        let vector = vec![0.5_f32];
        let query = to_search(&filters, Some(&vector), 10);
        assert!(query["query"]["script_score"]["script"]["source"].as_str().unwrap().contains("cosineSimilarity"));
        assert_eq!(query["query"]["script_score"]["query"], json!({"term": {"location": "SF"}}));
    }

    #[test]
    fn numeric_range_operators_preserve_open_closed_bounds() {
        let filters = single_rule_filter(Segment::EmployeeCount, Operator::Gte, FilterValue::Number(50.0));
        let query = to_search(&filters, None, 10);
        assert_eq!(query["query"], json!({"range": {"employee_count": {"gte": 50.0}}}));

        let filters = single_rule_filter(Segment::EmployeeCount, Operator::Gt, FilterValue::Number(50.0));
        let query = to_search(&filters, None, 10);
        assert_eq!(query["query"], json!({"range": {"employee_count": {"gt": 50.0}}}));
    }

    #[test]
    fn neq_is_must_not_term() {
        let filters = single_rule_filter(Segment::Location, Operator::Neq, FilterValue::Text("NYC".to_string()));
        let query = to_search(&filters, None, 10);
        assert_eq!(query["query"], json!({"bool": {"must_not": [{"term": {"location": "NYC"}}]}}));
    }
}
