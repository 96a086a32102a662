//! Admin endpoints (§6 "Admin endpoints (analytics, unknown-extraction
//! review) ... exist as collaborators; they do not participate in the core
//! pipeline"). Stubbed with their documented contracts and a
//! `not_implemented`-style placeholder body: the router surface is
//! complete without pretending the collaborator logic itself was built
//! here.

use crate::error::ApiError;
use axum::Json;
use discovery_core::{Error, ErrorCode};
use serde_json::Value;

/// Search-log and query-volume analytics (collaborator; out of scope).
#[utoipa::path(
    get,
    path = "/api/admin/analytics",
    responses(
        (status = 501, description = "Analytics collaborator not implemented", body = Object),
    ),
    tag = "admin"
)]
pub async fn analytics() -> Result<Json<Value>, ApiError> {
    Err(not_implemented("analytics"))
}

/// Review surface for the append-only unknown-extraction log (§3
/// "Unknown-extraction log"; collaborator, out of scope).
#[utoipa::path(
    get,
    path = "/api/admin/unknown-extractions",
    responses(
        (status = 501, description = "Unknown-extraction review collaborator not implemented", body = Object),
    ),
    tag = "admin"
)]
pub async fn unknown_extractions() -> Result<Json<Value>, ApiError> {
    Err(not_implemented("unknown-extraction review"))
}

fn not_implemented(surface: &str) -> ApiError {
    ApiError::new(Error::new(
        ErrorCode::NotImplemented,
        format!("{surface} is a collaborator surface outside this service's scope"),
    ))
}
