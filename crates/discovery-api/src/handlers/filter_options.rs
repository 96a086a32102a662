//! `GET /api/filter-options` (§6): the read-only segment vocabularies a
//! client can render as filter-picker options, one list per fuzzy segment
//! plus funding-stage, already sorted by [`VocabularyRepository::list`].

use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, Json};
use discovery_domain::SegmentKind;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct VocabularyOption {
    pub name: String,
    pub synonyms: Vec<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct FilterOptionsResponse {
    pub segments: BTreeMap<&'static str, Vec<VocabularyOption>>,
}

#[utoipa::path(
    get,
    path = "/api/filter-options",
    responses(
        (status = 200, description = "Sorted vocabulary options per segment", body = Object),
    ),
    tag = "query"
)]
pub async fn filter_options(State(state): State<AppState>) -> Result<Json<FilterOptionsResponse>, ApiError> {
    let mut segments = BTreeMap::new();

    for kind in SegmentKind::all() {
        let entries = state.vocabulary_repository.list(kind).await.map_err(ApiError::new)?;
        let options = entries
            .into_iter()
            .map(|entry| VocabularyOption {
                name: entry.name,
                synonyms: entry.synonyms,
                order_index: entry.order_index,
            })
            .collect();
        segments.insert(kind.as_segment().field_name(), options);
    }

    Ok(Json(FilterOptionsResponse { segments }))
}
