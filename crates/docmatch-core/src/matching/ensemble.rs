use tracing::debug;

use super::{
    DocumentTextIndex, ExactPatternMatcher, KeywordMatcher, PositionMatcher, TemplateMatcher,
};
use crate::models::config::{DocmatchConfig, EnsembleConfig};
use crate::models::result::{FieldMatch, StrategyKind, StrategyScores, TemplateMatchResult};
use crate::models::template::Template;

/// Merge the three single-strategy results for one template.
///
/// Each field takes the candidate with the highest confidence, preferring the
/// earlier strategy (exact, fuzzy, position) on ties. Aggregate confidence and
/// bbox accuracy are weighted sums of the strategies' own aggregates.
pub fn combine_results(
    template: &Template,
    exact: &TemplateMatchResult,
    fuzzy: &TemplateMatchResult,
    position: &TemplateMatchResult,
    weights: &EnsembleConfig,
) -> TemplateMatchResult {
    let results = [exact, fuzzy, position];

    let matches: Vec<FieldMatch> = template
        .field_names()
        .filter_map(|name| {
            let mut best: Option<&FieldMatch> = None;
            for candidate in results.iter().filter_map(|r| r.field(name)) {
                if best.is_none_or(|b| candidate.confidence > b.confidence) {
                    best = Some(candidate);
                }
            }
            best.cloned()
        })
        .collect();

    let confidence = weights.exact_weight * exact.confidence
        + weights.fuzzy_weight * fuzzy.confidence
        + weights.position_weight * position.confidence;
    let bbox_accuracy = weights.exact_bbox_weight * exact.bbox_accuracy
        + weights.fuzzy_bbox_weight * fuzzy.bbox_accuracy
        + weights.position_bbox_weight * position.bbox_accuracy;

    TemplateMatchResult::new(
        &template.id,
        template.field_names(),
        matches,
        confidence,
        bbox_accuracy,
        StrategyKind::Combined,
    )
    .with_strategy_scores(StrategyScores {
        exact: exact.confidence,
        fuzzy: fuzzy.confidence,
        position: position.confidence,
    })
}

/// The "combined" strategy: runs every single strategy and merges them.
#[derive(Debug, Clone)]
pub struct EnsembleMatcher {
    exact: ExactPatternMatcher,
    fuzzy: KeywordMatcher,
    position: PositionMatcher,
    weights: EnsembleConfig,
}

impl EnsembleMatcher {
    pub fn new() -> Self {
        Self::from_config(&DocmatchConfig::default())
    }

    pub fn from_config(config: &DocmatchConfig) -> Self {
        Self {
            exact: ExactPatternMatcher::from_config(&config.strategy),
            fuzzy: KeywordMatcher::from_config(&config.strategy),
            position: PositionMatcher::from_config(&config.strategy, &config.positions),
            weights: config.ensemble.clone(),
        }
    }
}

impl Default for EnsembleMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateMatcher for EnsembleMatcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Combined
    }

    fn evaluate(&self, index: &DocumentTextIndex<'_>, template: &Template) -> TemplateMatchResult {
        let exact = self.exact.evaluate(index, template);
        let fuzzy = self.fuzzy.evaluate(index, template);
        let position = self.position.evaluate(index, template);

        let combined = combine_results(template, &exact, &fuzzy, &position, &self.weights);
        debug!(
            "Combined {}: {:.3} (exact {:.3}, fuzzy {:.3}, position {:.3})",
            template.id, combined.confidence, exact.confidence, fuzzy.confidence, position.confidence
        );
        combined
    }
}
