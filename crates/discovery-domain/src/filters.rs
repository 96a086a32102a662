//! Typed filter DSL: segments, operators, logic, and the value types a
//! structured query can constrain a company search by.
//!
//! Grounded in the extracted Python filter model (`models/filters.py` in the
//! original implementation); the shape below mirrors
//! `crate::vocabulary::SegmentKind` one-to-one since every text `Rule`'s
//! value must be a canonical member of that segment's vocabulary (or, for
//! `FundingStage`, matched case-insensitively against it).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The named attribute axes a query can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Location,
    Industries,
    TargetMarkets,
    FundingStage,
    BusinessModels,
    RevenueModels,
    EmployeeCount,
    FundingAmount,
    StageOrder,
}

impl Segment {
    /// Text segments carry canonical vocabulary strings; numeric segments
    /// carry bare numbers. This governs which `FilterValue` variant and
    /// which `Operator`s are legal for a `Rule` on this segment.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            Segment::Location
                | Segment::Industries
                | Segment::TargetMarkets
                | Segment::FundingStage
                | Segment::BusinessModels
                | Segment::RevenueModels
        )
    }

    pub fn is_numeric(self) -> bool {
        !self.is_text()
    }

    /// The document field name this segment maps to in the search engine,
    /// per §4.7's "field names at the boundary" rule: the translator never
    /// remaps these.
    pub fn field_name(self) -> &'static str {
        match self {
            Segment::Location => "location",
            Segment::Industries => "industries",
            Segment::TargetMarkets => "target_markets",
            Segment::FundingStage => "funding_stage",
            Segment::BusinessModels => "business_models",
            Segment::RevenueModels => "revenue_models",
            Segment::EmployeeCount => "employee_count",
            Segment::FundingAmount => "funding_amount",
            Segment::StageOrder => "stage_order",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    /// Text segments only accept equality operators; numeric segments
    /// accept ordering too.
    pub fn valid_for(self, segment: Segment) -> bool {
        if segment.is_text() {
            matches!(self, Operator::Eq | Operator::Neq)
        } else {
            true
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    And,
    Or,
}

impl Default for Logic {
    fn default() -> Self {
        Logic::And
    }
}

/// A filter value: either a canonical text string or a number. `PartialEq`
/// is derived so excluded-value matching (§4.4 step 5, §4.5) can compare
/// `(segment, operator, value)` triples structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(f64),
}

impl FilterValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            FilterValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            FilterValue::Text(_) => None,
        }
    }
}

/// A single `(operator, value)` constraint within a segment filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub operator: Operator,
    pub value: FilterValue,
}

impl Rule {
    pub fn new(operator: Operator, value: FilterValue) -> Self {
        Self { operator, value }
    }
}

/// All constraints on one segment, combined by `logic`. Invariant: `rules`
/// is non-empty (an empty-rule `SegmentFilter` is dropped by the merger and
/// extractor rather than constructed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentFilter {
    pub segment: Segment,
    #[serde(default)]
    pub logic: Logic,
    pub rules: Vec<Rule>,
}

impl SegmentFilter {
    pub fn new(segment: Segment, logic: Logic, rules: Vec<Rule>) -> Self {
        Self { segment, logic, rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validates the invariants from §3: every rule's operator is legal for
    /// this segment's kind, and its value variant matches the kind (text
    /// segments carry `FilterValue::Text`, numeric segments carry
    /// `FilterValue::Number`).
    pub fn is_valid(&self) -> bool {
        self.rules.iter().all(|rule| {
            rule.operator.valid_for(self.segment)
                && match (self.segment.is_text(), &rule.value) {
                    (true, FilterValue::Text(_)) => true,
                    (false, FilterValue::Number(_)) => true,
                    _ => false,
                }
        })
    }
}

/// The full filter tree attached to a query: a top-level logic over an
/// ordered list of segment filters. An empty `segments` list is legal (no
/// structured constraints).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QueryFilters {
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub segments: Vec<SegmentFilter>,
}

impl QueryFilters {
    pub fn empty() -> Self {
        Self { logic: Logic::And, segments: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn find_segment(&self, segment: Segment) -> Option<&SegmentFilter> {
        self.segments.iter().find(|s| s.segment == segment)
    }
}

/// A previously-dismissed `(segment, operator, value)` triple: forbidden
/// from reappearing in merged filters (§4.4 step 5, §4.5 policy, §8
/// invariant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedFilterValue {
    pub segment: Segment,
    pub operator: Operator,
    pub value: FilterValue,
}

impl ExcludedFilterValue {
    pub fn matches(&self, segment: Segment, rule: &Rule) -> bool {
        self.segment == segment && self.operator == rule.operator && self.value == rule.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_segment_rejects_ordering_operators() {
        assert!(!Operator::Gt.valid_for(Segment::Industries));
        assert!(Operator::Eq.valid_for(Segment::Industries));
    }

    #[test]
    fn numeric_segment_accepts_all_operators() {
        for op in [Operator::Eq, Operator::Neq, Operator::Gt, Operator::Gte, Operator::Lt, Operator::Lte] {
            assert!(op.valid_for(Segment::EmployeeCount));
        }
    }

    #[test]
    fn segment_filter_validates_value_kind() {
        let valid = SegmentFilter::new(
            Segment::Industries,
            Logic::Or,
            vec![Rule::new(Operator::Eq, FilterValue::Text("FinTech".into()))],
        );
        assert!(valid.is_valid());

        let invalid = SegmentFilter::new(
            Segment::Industries,
            Logic::Or,
            vec![Rule::new(Operator::Eq, FilterValue::Number(1.0))],
        );
        assert!(!invalid.is_valid());
    }

    #[test]
    fn excluded_value_matches_structurally() {
        let excluded = ExcludedFilterValue {
            segment: Segment::Industries,
            operator: Operator::Eq,
            value: FilterValue::Text("FinTech".into()),
        };
        let rule = Rule::new(Operator::Eq, FilterValue::Text("FinTech".into()));
        assert!(excluded.matches(Segment::Industries, &rule));

        let other_rule = Rule::new(Operator::Eq, FilterValue::Text("Other".into()));
        assert!(!excluded.matches(Segment::Industries, &other_rule));
    }

    #[test]
    fn single_rule_segment_filter_round_trips_json() {
        let filter = SegmentFilter::new(
            Segment::Location,
            Logic::And,
            vec![Rule::new(Operator::Eq, FilterValue::Text("San Francisco".into()))],
        );
        let json = serde_json::to_string(&filter).unwrap();
        let back: SegmentFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(filter, back);
    }
}
