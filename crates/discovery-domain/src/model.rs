//! Company record and the informational thesis-context union returned
//! alongside it (§3 "Company record", "Thesis context").

use serde::{Deserialize, Serialize};

/// A hydrated company, as read back from the relational store during
/// orchestration (§4.9 step 9). Every non-null canonical field here is
/// guaranteed (by the seeder, not re-checked here) to be a member of its
/// segment's vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: i64,
    pub company_name: String,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub employee_count: Option<i64>,
    /// Whole USD dollars (§9 Open Question 1 — resolved, not cents).
    pub funding_amount: Option<i64>,
    pub location: Option<String>,
    pub funding_stage: Option<String>,
    pub stage_order: Option<i32>,
    pub industries: Vec<String>,
    pub target_markets: Vec<String>,
    pub business_models: Vec<String>,
    pub revenue_models: Vec<String>,
}

/// The HTTP-facing projection of a `Company` plus its rationale, per §6's
/// `POST /api/submit-query` response contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyResponse {
    pub id: i64,
    pub company_name: String,
    pub company_id: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub employee_count: Option<i64>,
    pub stage: Option<String>,
    pub funding_amount: Option<i64>,
    pub location: Option<String>,
    pub industries: Vec<String>,
    pub target_markets: Vec<String>,
    pub explanation: Option<String>,
}

impl CompanyResponse {
    pub fn from_company(company: Company, explanation: Option<String>) -> Self {
        Self {
            id: company.id,
            company_name: company.company_name,
            company_id: Some(company.id.to_string()),
            city: company.location.clone(),
            description: company.description,
            website_url: company.website_url,
            employee_count: company.employee_count,
            stage: company.funding_stage,
            funding_amount: company.funding_amount,
            location: company.location,
            industries: company.industries,
            target_markets: company.target_markets,
            explanation,
        }
    }
}

/// Concrete industry/technology/business-model/use-case terms a conceptual
/// thesis decomposes into (§3 "Thesis context").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoreConcepts {
    #[serde(default)]
    pub technology: Vec<String>,
    #[serde(default)]
    pub business_model: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub use_case: Option<String>,
}

/// A discriminated union rather than a free-form map (§9 design note
/// "Tagged outputs instead of dynamic types"): downstream code dispatches
/// on `type` via the adjacently-tagged serde representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThesisContext {
    Portfolio {
        summary: String,
        themes: Vec<String>,
        gaps: Vec<String>,
        complementary_areas: Vec<String>,
        strategic_reasoning: String,
    },
    Conceptual {
        summary: String,
        core_concepts: CoreConcepts,
        strategic_focus: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thesis_context_serializes_with_type_tag() {
        let portfolio = ThesisContext::Portfolio {
            summary: "s".into(),
            themes: vec!["consumer credit".into()],
            gaps: vec![],
            complementary_areas: vec!["AI automation".into()],
            strategic_reasoning: "r".into(),
        };
        let json = serde_json::to_value(&portfolio).unwrap();
        assert_eq!(json["type"], "portfolio");
        assert_eq!(json["themes"][0], "consumer credit");
    }

    #[test]
    fn company_response_carries_funding_amount_as_whole_dollars() {
        let company = Company {
            id: 1,
            company_name: "Acme".into(),
            description: None,
            website_url: None,
            employee_count: Some(50),
            funding_amount: Some(12_000_000),
            location: Some("San Francisco".into()),
            funding_stage: Some("Series A".into()),
            stage_order: Some(3),
            industries: vec!["FinTech".into()],
            target_markets: vec![],
            business_models: vec![],
            revenue_models: vec![],
        };
        let response = CompanyResponse::from_company(company, Some("matches".into()));
        assert_eq!(response.funding_amount, Some(12_000_000));
        assert_eq!(response.company_id.as_deref(), Some("1"));
    }
}
