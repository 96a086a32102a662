//! Segment vocabularies: the canonical string sets each text segment is
//! validated and canonicalized against (§3 "Vocabulary").
//!
//! Populated at seed time by the (out-of-scope) seeding collaborator;
//! read-only at query time except for the append-only unknown-extraction
//! log in [`crate::repository`]. Grounded in the vocabulary table layout of
//! `examples/original_source/backend/backend/db/database.py`.

use crate::filters::Segment;
use serde::{Deserialize, Serialize};

/// Every fuzzy (or exact-match, for `FundingStage`) segment kind that has a
/// backing vocabulary table. Distinct from `Segment` because numeric
/// segments (`EmployeeCount`, `FundingAmount`, `StageOrder`) have no
/// vocabulary of their own — `StageOrder` is derived from `FundingStage`'s
/// `order_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Location,
    Industries,
    TargetMarkets,
    BusinessModels,
    RevenueModels,
    FundingStage,
}

impl SegmentKind {
    pub fn as_segment(self) -> Segment {
        match self {
            SegmentKind::Location => Segment::Location,
            SegmentKind::Industries => Segment::Industries,
            SegmentKind::TargetMarkets => Segment::TargetMarkets,
            SegmentKind::BusinessModels => Segment::BusinessModels,
            SegmentKind::RevenueModels => Segment::RevenueModels,
            SegmentKind::FundingStage => Segment::FundingStage,
        }
    }

    /// Funding-stage is validated by exact case-insensitive match against
    /// the vocabulary table rather than fuzzy search (§4.1).
    pub fn is_fuzzy(self) -> bool {
        !matches!(self, SegmentKind::FundingStage)
    }

    pub fn all() -> [SegmentKind; 6] {
        [
            SegmentKind::Location,
            SegmentKind::Industries,
            SegmentKind::TargetMarkets,
            SegmentKind::BusinessModels,
            SegmentKind::RevenueModels,
            SegmentKind::FundingStage,
        ]
    }

    /// The inverse of [`SegmentKind::as_segment`]; `None` for the three
    /// numeric segments, which have no backing vocabulary.
    pub fn from_segment(segment: Segment) -> Option<SegmentKind> {
        match segment {
            Segment::Location => Some(SegmentKind::Location),
            Segment::Industries => Some(SegmentKind::Industries),
            Segment::TargetMarkets => Some(SegmentKind::TargetMarkets),
            Segment::BusinessModels => Some(SegmentKind::BusinessModels),
            Segment::RevenueModels => Some(SegmentKind::RevenueModels),
            Segment::FundingStage => Some(SegmentKind::FundingStage),
            Segment::EmployeeCount | Segment::FundingAmount | Segment::StageOrder => None,
        }
    }
}

/// One canonical vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VocabularyEntry {
    pub id: i64,
    pub kind: String,
    pub name: String,
    /// Synonym surface forms, injected at search-index build time as a
    /// search-time synonym filter (§6 "Segment-vocabulary indices").
    pub synonyms: Vec<String>,
    /// Only populated (and only meaningful) for `SegmentKind::FundingStage`;
    /// strictly increasing across the funding-stage vocabulary.
    pub order_index: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn funding_stage_is_not_fuzzy() {
        assert!(!SegmentKind::FundingStage.is_fuzzy());
        assert!(SegmentKind::Industries.is_fuzzy());
    }

    #[test]
    fn segment_kind_round_trips_to_segment() {
        for kind in SegmentKind::all() {
            let segment = kind.as_segment();
            assert!(segment.is_text());
        }
    }
}
