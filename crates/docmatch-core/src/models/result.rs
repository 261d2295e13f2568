//! Match results returned to callers.

use std::collections::BTreeMap;

use serde::Serialize;

use super::document::BoundingBox;

/// Strategy that produced a [`TemplateMatchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Exact,
    Fuzzy,
    Position,
    Combined,
}

impl StrategyKind {
    /// All strategies in evaluation (and tie-break) order.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Exact,
        StrategyKind::Fuzzy,
        StrategyKind::Position,
        StrategyKind::Combined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Exact => "exact",
            StrategyKind::Fuzzy => "fuzzy",
            StrategyKind::Position => "position",
            StrategyKind::Combined => "combined",
        }
    }

    /// Parse a strategy tag.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "exact" | "exact_pattern" => Some(StrategyKind::Exact),
            "fuzzy" | "fuzzy_match" => Some(StrategyKind::Fuzzy),
            "position" | "position_based" => Some(StrategyKind::Position),
            "combined" => Some(StrategyKind::Combined),
            _ => None,
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a field value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    Position,
    /// Filled from document metadata during refinement.
    Metadata,
    /// Filled from a detected process-flow step during refinement.
    ProcessFlow,
    /// Found by a generic pattern when no template matched.
    Fallback,
}

/// A single extracted field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMatch {
    #[serde(skip)]
    pub field_name: String,
    pub value: String,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    pub method: MatchMethod,
    pub bbox: Option<BoundingBox>,
}

impl FieldMatch {
    pub fn new(
        field_name: impl Into<String>,
        value: impl Into<String>,
        confidence: f32,
        method: MatchMethod,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            method,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: Option<BoundingBox>) -> Self {
        self.bbox = bbox;
        self
    }
}

/// Aggregate confidences of the individual strategies behind a combined result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrategyScores {
    pub exact: f32,
    pub fuzzy: f32,
    pub position: f32,
}

/// Outcome of evaluating one template against one document.
///
/// `matched_fields` and `missing_fields` partition the attempted field names.
/// Results are values: refinement produces a new result instead of mutating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateMatchResult {
    pub template_id: String,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    pub matched_fields: BTreeMap<String, FieldMatch>,
    /// Unmatched field names in declaration order.
    pub missing_fields: Vec<String>,
    /// Bounding box accuracy (0.0 - 1.0).
    pub bbox_accuracy: f32,
    pub strategy_used: StrategyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_scores: Option<StrategyScores>,
}

impl TemplateMatchResult {
    /// Build a result from matches, deriving `missing_fields` from the attempted names.
    ///
    /// Matches for names outside `attempted` are kept; scores are clamped to [0, 1].
    pub fn new<'a>(
        template_id: impl Into<String>,
        attempted: impl IntoIterator<Item = &'a str>,
        matches: impl IntoIterator<Item = FieldMatch>,
        confidence: f32,
        bbox_accuracy: f32,
        strategy_used: StrategyKind,
    ) -> Self {
        let matched_fields: BTreeMap<String, FieldMatch> = matches
            .into_iter()
            .map(|m| (m.field_name.clone(), m))
            .collect();
        let missing_fields = attempted
            .into_iter()
            .filter(|name| !matched_fields.contains_key(*name))
            .map(str::to_string)
            .collect();

        Self {
            template_id: template_id.into(),
            confidence: clamp_unit(confidence),
            matched_fields,
            missing_fields,
            bbox_accuracy: clamp_unit(bbox_accuracy),
            strategy_used,
            strategy_scores: None,
        }
    }

    pub fn with_strategy_scores(mut self, scores: StrategyScores) -> Self {
        self.strategy_scores = Some(scores);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldMatch> {
        self.matched_fields.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.matched_fields.get(name).map(|m| m.value.as_str())
    }

    pub fn is_missing(&self, name: &str) -> bool {
        self.missing_fields.iter().any(|m| m == name)
    }

    /// Fraction of matched fields that carry a bounding box.
    pub fn bbox_coverage(&self) -> f32 {
        if self.matched_fields.is_empty() {
            return 0.0;
        }
        let with_bbox = self
            .matched_fields
            .values()
            .filter(|m| m.bbox.is_some())
            .count();
        with_bbox as f32 / self.matched_fields.len() as f32
    }

    /// Move a missing field into the matched set, returning a new result.
    pub(crate) fn fill_missing(mut self, field: FieldMatch) -> Self {
        self.missing_fields.retain(|name| *name != field.field_name);
        self.matched_fields.insert(field.field_name.clone(), field);
        self
    }
}

/// Clamp to [0, 1], mapping NaN to 0.
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
