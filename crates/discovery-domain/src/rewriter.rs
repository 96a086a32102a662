//! Query Rewriter (§4.6): strips portfolio/meta framing from the query text
//! before it is embedded for the kNN leg of the hybrid search.
//!
//! Grounded in `examples/original_source/backend/backend/llm/query_rewriter.py`.

use crate::filters::{Operator, QueryFilters, Segment};
use crate::llm_client::LlmClient;

const SYSTEM_PROMPT: &str = "Rewrite the user's query into a concise, industry/technology-keyword search \
    phrase suitable for a semantic embedding search. Strip portfolio framing (\"my investments include\", \
    \"suggest additions\") and meta commentary. Bias word choice toward the vocabulary named in the applied \
    filters when given. Respond as a JSON object with a single key `rewritten_query`.";

pub struct QueryRewriter {
    llm: LlmClient,
}

impl QueryRewriter {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// `rewrite(query, applied-filters) → cleaned-query`. Idempotent in
    /// effect; returns the original string unchanged on any failure or
    /// empty model output (§4.6).
    pub async fn rewrite(&self, query: &str, applied_filters: &QueryFilters) -> String {
        let prompt = format!("Query: {}\nApplied filters: {}", query, describe_filters(applied_filters));

        match self.llm.complete_json(SYSTEM_PROMPT, &prompt).await {
            Ok(value) => match value.get("rewritten_query").and_then(|v| v.as_str()) {
                Some(rewritten) if !rewritten.trim().is_empty() => rewritten.trim().to_string(),
                _ => query.to_string(),
            },
            Err(_) => query.to_string(),
        }
    }
}

/// A human-readable summary of applied filters, used both to bias the
/// rewrite (§4.6) and, reused by the Explanation Engine, to describe the
/// search to the language model (§4.8 step 3).
pub fn describe_filters(filters: &QueryFilters) -> String {
    if filters.segments.is_empty() {
        return "none".to_string();
    }

    filters
        .segments
        .iter()
        .map(|segment_filter| {
            let rules = segment_filter
                .rules
                .iter()
                .map(|rule| format!("{} {}", describe_operator(rule.operator), describe_value(&rule.value, segment_filter.segment)))
                .collect::<Vec<_>>()
                .join(&format!(" {:?} ", segment_filter.logic));
            format!("{}: {}", segment_filter.segment, rules)
        })
        .collect::<Vec<_>>()
        .join(&format!(" {:?} ", filters.logic))
}

/// Operator-to-symbol mapping, matching `explainer.py::format_operator`.
fn describe_operator(operator: Operator) -> &'static str {
    match operator {
        Operator::Eq => "=",
        Operator::Neq => "!=",
        Operator::Gt => ">",
        Operator::Gte => ">=",
        Operator::Lt => "<",
        Operator::Lte => "<=",
    }
}

/// Formats a rule's value for display, rendering `FundingAmount` as
/// human-readable currency the way `explainer.py::format_value` does.
fn describe_value(value: &crate::filters::FilterValue, segment: Segment) -> String {
    match value {
        crate::filters::FilterValue::Text(s) => s.clone(),
        crate::filters::FilterValue::Number(n) if segment == Segment::FundingAmount => format_currency(*n),
        crate::filters::FilterValue::Number(n) => n.to_string(),
    }
}

fn format_currency(amount: f64) -> String {
    if amount >= 1_000_000.0 {
        format!("${:.1}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("${:.1}K", amount / 1_000.0)
    } else {
        format!("${amount:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterValue, Logic, Operator, Rule, Segment, SegmentFilter};

    #[test]
    fn describe_filters_handles_empty() {
        assert_eq!(describe_filters(&QueryFilters::empty()), "none");
    }

    #[test]
    fn describe_filters_renders_segment_and_rules() {
        let filters = QueryFilters {
            logic: Logic::And,
            segments: vec![SegmentFilter::new(
                Segment::Location,
                Logic::And,
                vec![Rule::new(Operator::Eq, FilterValue::Text("San Francisco".to_string()))],
            )],
        };
        let description = describe_filters(&filters);
        assert!(description.contains("location"));
        assert!(description.contains("San Francisco"));
    }

    #[test]
    fn describe_filters_renders_funding_amount_as_currency() {
        let filters = QueryFilters {
            logic: Logic::And,
            segments: vec![SegmentFilter::new(
                Segment::FundingAmount,
                Logic::And,
                vec![Rule::new(Operator::Gte, FilterValue::Number(5_000_000.0))],
            )],
        };
        let description = describe_filters(&filters);
        assert!(description.contains(">= $5.0M"));
    }

    #[test]
    fn format_currency_renders_thousands_and_small_amounts() {
        assert_eq!(format_currency(250_000.0), "$250.0K");
        assert_eq!(format_currency(500.0), "$500");
    }
}
