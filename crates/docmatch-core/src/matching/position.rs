use tracing::debug;

use super::{DocumentTextIndex, TemplateMatcher};
use crate::models::config::{PositionProfiles, StrategyConfig};
use crate::models::document::BoundingBox;
use crate::models::result::{FieldMatch, MatchMethod, StrategyKind, TemplateMatchResult};
use crate::models::template::{PositionHint, Template};

/// Score a box against an expected region.
///
/// `y_weight` if the vertical midpoint lies in the range, plus `height_weight`
/// scaled by how close the box height is to the typical height.
pub fn position_score(
    bbox: &BoundingBox,
    hint: &PositionHint,
    y_weight: f32,
    height_weight: f32,
) -> f32 {
    let y_score = if hint.contains_y(bbox.center_y()) { 1.0 } else { 0.0 };
    let height_score =
        (1.0 - (bbox.height() - hint.typical_height).abs() / hint.typical_height).max(0.0);
    y_weight * y_score + height_weight * height_score
}

/// Layout matching: picks the block whose position best fits the field's region.
#[derive(Debug, Clone)]
pub struct PositionMatcher {
    y_weight: f32,
    height_weight: f32,
    threshold: f32,
    penalty: f32,
    profiles: PositionProfiles,
}

impl PositionMatcher {
    pub fn new() -> Self {
        Self::from_config(&StrategyConfig::default(), &PositionProfiles::default())
    }

    pub fn from_config(config: &StrategyConfig, profiles: &PositionProfiles) -> Self {
        Self {
            y_weight: config.position_y_weight,
            height_weight: config.position_height_weight,
            threshold: config.position_threshold,
            penalty: config.position_penalty,
            profiles: profiles.clone(),
        }
    }
}

impl Default for PositionMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateMatcher for PositionMatcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Position
    }

    fn evaluate(&self, index: &DocumentTextIndex<'_>, template: &Template) -> TemplateMatchResult {
        let mut matches = Vec::new();
        let mut scores = Vec::new();

        for field in template.fields() {
            let hint = field
                .position_hint
                .as_ref()
                .unwrap_or_else(|| self.profiles.for_kind(field.kind));

            let mut best: Option<(&str, BoundingBox, f32)> = None;
            for (block, bbox) in index.positioned_blocks() {
                let score = position_score(&bbox, hint, self.y_weight, self.height_weight);
                if score >= self.threshold && best.is_none_or(|(_, _, s)| score > s) {
                    best = Some((block.text, bbox, score));
                }
            }

            if let Some((text, bbox, score)) = best {
                debug!("Position match for {}.{} ({:.2})", template.id, field.name, score);
                scores.push(score);
                matches.push(
                    FieldMatch::new(&field.name, text.trim(), score, MatchMethod::Position)
                        .with_bbox(Some(bbox)),
                );
            }
        }

        let total: f32 = scores.iter().sum();
        let field_count = template.fields().len();
        let confidence = if field_count > 0 {
            total / field_count as f32 * self.penalty
        } else {
            0.0
        };
        let bbox_accuracy = if scores.is_empty() {
            0.0
        } else {
            total / scores.len() as f32
        };

        TemplateMatchResult::new(
            &template.id,
            template.field_names(),
            matches,
            confidence,
            bbox_accuracy,
            StrategyKind::Position,
        )
    }
}
