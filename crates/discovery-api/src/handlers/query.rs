//! `POST /api/submit-query` (§6): the one handler that drives the query
//! pipeline end to end via [`discovery_domain::SearchOrchestrator`].

use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, Json};
use discovery_core::{Error, ErrorCode};
use discovery_domain::{CompanyResponse, ExcludedFilterValue, QueryFilters, ThesisContext};
use serde::{Deserialize, Serialize};

const DEFAULT_RESULT_SIZE: usize = 20;
const MAX_RESULT_SIZE: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SubmitQueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub filters: Option<QueryFilters>,
    #[serde(default)]
    pub excluded_values: Vec<ExcludedFilterValue>,
    #[serde(default)]
    pub size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQueryResponse {
    pub companies: Vec<CompanyResponse>,
    pub applied_filters: QueryFilters,
    pub thesis_context: Option<ThesisContext>,
}

/// Runs the full query pipeline (classify → thesis/conceptual expansion →
/// extract → merge → rewrite → embed → translate → search → hydrate →
/// explain) and returns ranked, explained companies.
#[utoipa::path(
    post,
    path = "/api/submit-query",
    responses(
        (status = 200, description = "Ranked companies with rationales", body = Object),
        (status = 400, description = "Malformed request body", body = Object),
        (status = 500, description = "Data-plane outage during hydration", body = Object),
    ),
    tag = "query"
)]
pub async fn submit_query(
    State(state): State<AppState>,
    Json(request): Json<SubmitQueryRequest>,
) -> Result<Json<SubmitQueryResponse>, ApiError> {
    let query = request.query.unwrap_or_default();
    let user_filters = request.filters.unwrap_or_default();
    let size = request.size.unwrap_or(DEFAULT_RESULT_SIZE).min(MAX_RESULT_SIZE);

    if size == 0 {
        return Err(ApiError::new(Error::new(
            ErrorCode::InvalidInput,
            "size must be greater than zero",
        )));
    }

    let outcome = state
        .orchestrator
        .search(&query, &user_filters, &request.excluded_values, size)
        .await
        .map_err(ApiError::new)?;

    let companies = outcome
        .results
        .into_iter()
        .map(|(company, explanation)| CompanyResponse::from_company(company, explanation))
        .collect();

    Ok(Json(SubmitQueryResponse {
        companies,
        applied_filters: outcome.applied_filters,
        thesis_context: outcome.thesis_context,
    }))
}
