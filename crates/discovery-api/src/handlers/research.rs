//! `POST /api/research` (§6 "research endpoints exist as collaborators";
//! §5 "An optional per-result research fan-out"). The fan-out mechanics —
//! one `tokio::spawn` per result id, an independent `tokio::time::timeout`
//! per task, errors reduced to per-result strings rather than a
//! request-wide failure, joined with `futures::future::join_all` — are
//! real; the web-lookup collaborator itself is explicitly out of scope, so
//! each task resolves to a placeholder string instead of calling out to
//! anything.

use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const RESEARCH_TASK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub company_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ResearchResult {
    pub company_id: i64,
    pub finding: String,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    pub results: Vec<ResearchResult>,
}

/// Research fan-out: a collaborator endpoint outside the core orchestrator
/// contract, present to complete the router surface without pretending the
/// underlying web-enrichment collaborator was built here.
#[utoipa::path(
    post,
    path = "/api/research",
    responses(
        (status = 200, description = "Per-company placeholder findings", body = Object),
    ),
    tag = "research"
)]
pub async fn research(Json(request): Json<ResearchRequest>) -> Json<ResearchResponse> {
    let tasks = request.company_ids.into_iter().map(|company_id| {
        tokio::spawn(async move {
            let finding = match tokio::time::timeout(RESEARCH_TASK_TIMEOUT, research_one(company_id)).await {
                Ok(finding) => finding,
                Err(_) => "research task timed out".to_string(),
            };
            ResearchResult { company_id, finding }
        })
    });

    let results = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter_map(Result::ok)
        .collect();

    Json(ResearchResponse { results })
}

/// Placeholder per-id lookup. The real implementation — an external
/// web-research collaborator — is out of scope; this always resolves so
/// the fan-out's cancellation/timeout machinery above is exercised.
async fn research_one(_company_id: i64) -> String {
    "research collaborator not implemented".to_string()
}
