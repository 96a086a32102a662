//! Query Classifier (§4.2): decides whether a query is an explicit search
//! or a portfolio-analysis request, and whether an explicit search is
//! conceptual.
//!
//! Grounded in `examples/original_source/backend/backend/llm/query_classifier.py`.

use crate::llm_client::LlmClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClass {
    ExplicitSearch,
    PortfolioAnalysis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub class: QueryClass,
    pub is_conceptual: bool,
    pub confidence: f64,
    pub reasoning: String,
}

impl Classification {
    fn fallback() -> Self {
        Self {
            class: QueryClass::ExplicitSearch,
            is_conceptual: false,
            confidence: 0.5,
            reasoning: "fallback".to_string(),
        }
    }
}

const SYSTEM_PROMPT: &str = "You classify a company-search query. Respond as a JSON object with keys \
    `class` (\"explicit_search\" or \"portfolio_analysis\"), `is_conceptual` (boolean), \
    `confidence` (0 to 1), and `reasoning` (string).";

pub struct QueryClassifier {
    llm: LlmClient,
}

impl QueryClassifier {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// `classify(query) → (class, is_conceptual, confidence, reasoning)`.
    /// On any failure, falls back to `(explicit-search, false, 0.5,
    /// "fallback")` — classification is advisory, never fatal (§4.2).
    pub async fn classify(&self, query: &str) -> Classification {
        match self.llm.complete_json(SYSTEM_PROMPT, query).await {
            Ok(value) => Self::coerce(&value),
            Err(_) => Classification::fallback(),
        }
    }

    /// Coerces a raw (possibly malformed) model response into a valid
    /// `Classification`: unknown class values fall back to explicit-search,
    /// confidence is clamped to `[0,1]`, and `is_conceptual` is coerced to a
    /// bool (§4.2 "Inputs out of range are coerced").
    fn coerce(value: &serde_json::Value) -> Classification {
        let class = match value.get("class").and_then(|v| v.as_str()) {
            Some("portfolio_analysis") => QueryClass::PortfolioAnalysis,
            _ => QueryClass::ExplicitSearch,
        };
        let is_conceptual = value.get("is_conceptual").map(truthy).unwrap_or(false);
        let confidence = value
            .get("confidence")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);
        let reasoning = value
            .get("reasoning")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Classification { class, is_conceptual, confidence, reasoning }
    }
}

fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "yes" | "1"),
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_class_coerces_to_explicit_search() {
        let value = json!({"class": "something_else", "is_conceptual": false, "confidence": 0.9, "reasoning": "r"});
        let classification = QueryClassifier::coerce(&value);
        assert_eq!(classification.class, QueryClass::ExplicitSearch);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let value = json!({"class": "explicit_search", "confidence": 5.0});
        assert_eq!(QueryClassifier::coerce(&value).confidence, 1.0);

        let value = json!({"class": "explicit_search", "confidence": -5.0});
        assert_eq!(QueryClassifier::coerce(&value).confidence, 0.0);
    }

    #[test]
    fn string_is_conceptual_is_coerced_to_bool() {
        let value = json!({"class": "explicit_search", "is_conceptual": "true"});
        assert!(QueryClassifier::coerce(&value).is_conceptual);
    }

    #[test]
    fn fallback_matches_documented_neutral_result() {
        let fallback = Classification::fallback();
        assert_eq!(fallback.class, QueryClass::ExplicitSearch);
        assert!(!fallback.is_conceptual);
        assert_eq!(fallback.confidence, 0.5);
        assert_eq!(fallback.reasoning, "fallback");
    }
}
