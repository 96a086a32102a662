//! Thesis Expander (§4.3): portfolio-gap analysis and conceptual-thesis
//! decomposition, both language-model calls with structured output.
//!
//! Grounded in
//! `examples/original_source/backend/backend/llm/{portfolio_analyzer,thesis_expander}.py`.

use crate::llm_client::LlmClient;
use crate::model::{CoreConcepts, ThesisContext};
use serde_json::Value;

const PORTFOLIO_SYSTEM_PROMPT: &str = "You analyze a venture portfolio description. Respond as a JSON object \
    with keys `summary`, `themes` (array of strings), `gaps` (array of strings), \
    `complementary_areas` (array of strings), `strategic_reasoning`, and `expanded_query`.";

const CONCEPTUAL_SYSTEM_PROMPT: &str = "You decompose an abstract investment thesis into concrete search \
    terms. Respond as a JSON object with keys `summary`, `core_concepts` (object with `technology`, \
    `business_model`, `industries` arrays and a `use_case` string), `strategic_focus`, and `expanded_query`.";

pub struct Expansion {
    pub expanded_query: String,
    pub context: ThesisContext,
}

pub struct ThesisExpander {
    llm: LlmClient,
}

impl ThesisExpander {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// `analyze-portfolio(query) → portfolio-context`. Returns `None` on
    /// any failure; the caller proceeds with the original query (§4.3).
    pub async fn analyze_portfolio(&self, query: &str) -> Option<Expansion> {
        let value = self.llm.complete_json(PORTFOLIO_SYSTEM_PROMPT, query).await.ok()?;
        Self::parse_portfolio(&value)
    }

    /// `expand-conceptual(query) → conceptual-context`.
    pub async fn expand_conceptual(&self, query: &str) -> Option<Expansion> {
        let value = self.llm.complete_json(CONCEPTUAL_SYSTEM_PROMPT, query).await.ok()?;
        Self::parse_conceptual(&value)
    }

    fn parse_portfolio(value: &Value) -> Option<Expansion> {
        let expanded_query = value.get("expanded_query")?.as_str()?.to_string();
        let strings = |key: &str| -> Vec<String> {
            value
                .get(key)
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default()
        };

        let context = ThesisContext::Portfolio {
            summary: value.get("summary")?.as_str()?.to_string(),
            themes: strings("themes"),
            gaps: strings("gaps"),
            complementary_areas: strings("complementary_areas"),
            strategic_reasoning: value.get("strategic_reasoning").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        };

        Some(Expansion { expanded_query, context })
    }

    fn parse_conceptual(value: &Value) -> Option<Expansion> {
        let expanded_query = value.get("expanded_query")?.as_str()?.to_string();
        let concepts = value.get("core_concepts");
        let strings = |key: &str| -> Vec<String> {
            concepts
                .and_then(|c| c.get(key))
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default()
        };

        let core_concepts = CoreConcepts {
            technology: strings("technology"),
            business_model: strings("business_model"),
            industries: strings("industries"),
            use_case: concepts.and_then(|c| c.get("use_case")).and_then(|v| v.as_str()).map(str::to_string),
        };

        let context = ThesisContext::Conceptual {
            summary: value.get("summary")?.as_str()?.to_string(),
            core_concepts,
            strategic_focus: value.get("strategic_focus").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        };

        Some(Expansion { expanded_query, context })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_well_formed_portfolio_response() {
        let value = json!({
            "summary": "s",
            "themes": ["consumer credit", "AI automation"],
            "gaps": [],
            "complementary_areas": ["B2B financial infrastructure"],
            "strategic_reasoning": "r",
            "expanded_query": "B2B financial infrastructure APIs",
        });
        let expansion = ThesisExpander::parse_portfolio(&value).unwrap();
        assert_eq!(expansion.expanded_query, "B2B financial infrastructure APIs");
        match expansion.context {
            ThesisContext::Portfolio { themes, complementary_areas, .. } => {
                assert!(themes.contains(&"consumer credit".to_string()));
                assert!(!complementary_areas.is_empty());
            }
            _ => panic!("expected portfolio context"),
        }
    }

    #[test]
    fn missing_expanded_query_fails_to_parse() {
        let value = json!({"summary": "s"});
        assert!(ThesisExpander::parse_portfolio(&value).is_none());
    }

    #[test]
    fn parses_conceptual_response_with_nested_core_concepts() {
        let value = json!({
            "summary": "s",
            "core_concepts": {
                "technology": ["LLMs"],
                "business_model": ["SaaS"],
                "industries": ["Healthcare"],
                "use_case": "billing automation",
            },
            "strategic_focus": "focus",
            "expanded_query": "AI healthcare billing",
        });
        let expansion = ThesisExpander::parse_conceptual(&value).unwrap();
        match expansion.context {
            ThesisContext::Conceptual { core_concepts, .. } => {
                assert_eq!(core_concepts.use_case.as_deref(), Some("billing automation"));
            }
            _ => panic!("expected conceptual context"),
        }
    }
}
