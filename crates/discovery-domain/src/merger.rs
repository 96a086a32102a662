//! Filter Merger (§4.5): combines user-supplied and model-extracted filters
//! with per-segment override semantics and value-level exclusion.
//!
//! Grounded in `examples/original_source/backend/backend/logic/filter_merger.py`.

use crate::filters::{Logic, QueryFilters, SegmentFilter};
use crate::filters::ExcludedFilterValue;

/// `merge(user-filters, extracted-filters, excluded-values) → QueryFilters`.
///
/// Policy (§4.5): excluded-values are applied to both inputs first; then,
/// per segment, a user-supplied `SegmentFilter` fully discards the
/// extracted side's filter for that same segment (other extracted segments
/// survive); top-level logic prefers the user's, then the extracted side's,
/// defaulting to AND.
pub fn merge(
    user_filters: &QueryFilters,
    extracted_filters: &QueryFilters,
    excluded_values: &[ExcludedFilterValue],
) -> QueryFilters {
    let user_filtered = apply_exclusions(user_filters, excluded_values);
    let extracted_filtered = apply_exclusions(extracted_filters, excluded_values);

    let user_segments: Vec<_> = user_filtered.segments.iter().map(|s| s.segment).collect();

    let mut segments = user_filtered.segments.clone();
    for segment_filter in extracted_filtered.segments {
        if !user_segments.contains(&segment_filter.segment) {
            segments.push(segment_filter);
        }
    }

    let logic = if !user_filters.segments.is_empty() {
        user_filters.logic
    } else if !extracted_filters.segments.is_empty() {
        extracted_filters.logic
    } else {
        Logic::And
    };

    QueryFilters { logic, segments }
}

/// Drops any rule whose `(segment, operator, value)` triple is in
/// `excluded_values`, then drops any `SegmentFilter` left with no rules.
fn apply_exclusions(filters: &QueryFilters, excluded_values: &[ExcludedFilterValue]) -> QueryFilters {
    let segments: Vec<SegmentFilter> = filters
        .segments
        .iter()
        .filter_map(|segment_filter| {
            let rules: Vec<_> = segment_filter
                .rules
                .iter()
                .filter(|rule| !excluded_values.iter().any(|excluded| excluded.matches(segment_filter.segment, rule)))
                .cloned()
                .collect();

            (!rules.is_empty()).then(|| SegmentFilter::new(segment_filter.segment, segment_filter.logic, rules))
        })
        .collect();

    QueryFilters { logic: filters.logic, segments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterValue, Operator, Rule, Segment};

    fn industries_filter(value: &str) -> QueryFilters {
        QueryFilters {
            logic: Logic::And,
            segments: vec![SegmentFilter::new(
                Segment::Industries,
                Logic::Or,
                vec![Rule::new(Operator::Eq, FilterValue::Text(value.to_string()))],
            )],
        }
    }

    #[test]
    fn user_segment_discards_extracted_segment_entirely() {
        let user = industries_filter("Healthcare");
        let extracted = industries_filter("FinTech");
        let merged = merge(&user, &extracted, &[]);

        assert_eq!(merged.segments.len(), 1);
        assert_eq!(merged.segments[0].rules[0].value, FilterValue::Text("Healthcare".to_string()));
    }

    #[test]
    fn extracted_segments_outside_user_set_survive() {
        let user = industries_filter("Healthcare");
        let mut extracted = QueryFilters::empty();
        extracted.segments.push(SegmentFilter::new(
            Segment::Location,
            Logic::And,
            vec![Rule::new(Operator::Eq, FilterValue::Text("San Francisco".to_string()))],
        ));

        let merged = merge(&user, &extracted, &[]);
        assert_eq!(merged.segments.len(), 2);
    }

    #[test]
    fn excluded_value_triple_is_dropped_and_empty_segment_removed() {
        let extracted = industries_filter("FinTech");
        let excluded = vec![ExcludedFilterValue {
            segment: Segment::Industries,
            operator: Operator::Eq,
            value: FilterValue::Text("FinTech".to_string()),
        }];

        let merged = merge(&QueryFilters::empty(), &extracted, &excluded);
        assert!(merged.segments.is_empty());
    }

    #[test]
    fn logic_prefers_user_then_extracted_then_defaults_and() {
        let mut user = QueryFilters::empty();
        user.logic = Logic::Or;
        user.segments.push(SegmentFilter::new(
            Segment::Location,
            Logic::And,
            vec![Rule::new(Operator::Eq, FilterValue::Text("NYC".to_string()))],
        ));
        let extracted = industries_filter("FinTech");

        let merged = merge(&user, &extracted, &[]);
        assert_eq!(merged.logic, Logic::Or);

        let no_user = merge(&QueryFilters::empty(), &extracted, &[]);
        assert_eq!(no_user.logic, Logic::And);
    }
}
