//! Template matching strategies, ensemble, refinement and selection.

mod bbox;
mod ensemble;
mod exact;
mod fuzzy;
mod index;
mod position;
mod refine;
mod selector;
mod similarity;
pub mod patterns;

pub use bbox::BboxEstimator;
pub use ensemble::{EnsembleMatcher, combine_results};
pub use exact::ExactPatternMatcher;
pub use fuzzy::{KeywordMatcher, field_keywords};
pub use index::{BlockRegion, DocumentTextIndex, IndexedBlock};
pub use position::{PositionMatcher, position_score};
pub use refine::Refiner;
pub use selector::{FALLBACK_TEMPLATE_ID, TemplateSelector};
pub use similarity::text_similarity;

use crate::models::config::DocmatchConfig;
use crate::models::result::{StrategyKind, TemplateMatchResult};
use crate::models::template::Template;

/// Common interface of every matching strategy.
pub trait TemplateMatcher {
    /// Strategy tag reported on results.
    fn kind(&self) -> StrategyKind;

    /// Score one template against one document.
    fn evaluate(&self, index: &DocumentTextIndex<'_>, template: &Template) -> TemplateMatchResult;
}

/// The closed set of strategies, selected by tag.
#[derive(Debug, Clone)]
pub enum Strategy {
    Exact(ExactPatternMatcher),
    Fuzzy(KeywordMatcher),
    Position(PositionMatcher),
    Combined(EnsembleMatcher),
}

impl Strategy {
    /// Build the strategy for a tag from configuration.
    pub fn from_kind(kind: StrategyKind, config: &DocmatchConfig) -> Self {
        match kind {
            StrategyKind::Exact => Strategy::Exact(ExactPatternMatcher::from_config(&config.strategy)),
            StrategyKind::Fuzzy => Strategy::Fuzzy(KeywordMatcher::from_config(&config.strategy)),
            StrategyKind::Position => Strategy::Position(PositionMatcher::from_config(
                &config.strategy,
                &config.positions,
            )),
            StrategyKind::Combined => Strategy::Combined(EnsembleMatcher::from_config(config)),
        }
    }

    /// Every strategy in tie-break order.
    pub fn all(config: &DocmatchConfig) -> Vec<Self> {
        StrategyKind::ALL
            .iter()
            .map(|kind| Self::from_kind(*kind, config))
            .collect()
    }
}

impl TemplateMatcher for Strategy {
    fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Exact(m) => m.kind(),
            Strategy::Fuzzy(m) => m.kind(),
            Strategy::Position(m) => m.kind(),
            Strategy::Combined(m) => m.kind(),
        }
    }

    fn evaluate(&self, index: &DocumentTextIndex<'_>, template: &Template) -> TemplateMatchResult {
        match self {
            Strategy::Exact(m) => m.evaluate(index, template),
            Strategy::Fuzzy(m) => m.evaluate(index, template),
            Strategy::Position(m) => m.evaluate(index, template),
            Strategy::Combined(m) => m.evaluate(index, template),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_strategy_dispatch_tags_results() {
        let config = DocmatchConfig::default();
        let document = standard_document();
        let index = DocumentTextIndex::new(&document);
        let template = standard_template();

        for strategy in Strategy::all(&config) {
            let result = strategy.evaluate(&index, &template);
            assert_eq!(result.strategy_used, strategy.kind());
            assert_eq!(result.template_id, "tech_std");
        }
    }

    #[test]
    fn test_results_are_reproducible() {
        let config = DocmatchConfig::default();
        let document = standard_document();
        let index = DocumentTextIndex::new(&document);
        let template = standard_template();

        for strategy in Strategy::all(&config) {
            let first = serde_json::to_string(&strategy.evaluate(&index, &template)).unwrap();
            let second = serde_json::to_string(&strategy.evaluate(&index, &template)).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_range_invariant() {
        let config = DocmatchConfig::default();
        let document = standard_document();
        let index = DocumentTextIndex::new(&document);
        let template = standard_template();

        for strategy in Strategy::all(&config) {
            let result = strategy.evaluate(&index, &template);
            assert!((0.0..=1.0).contains(&result.confidence));
            assert!((0.0..=1.0).contains(&result.bbox_accuracy));
            for field in result.matched_fields.values() {
                assert!((0.0..=1.0).contains(&field.confidence));
            }
        }
    }
}
