//! Picks the best (template, strategy) result for a document.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info};

use super::patterns::{FALLBACK_KINDS, capture_value, fallback_field_name, generic_patterns};
use super::{DocumentTextIndex, Refiner, Strategy, TemplateMatcher};
use crate::models::config::DocmatchConfig;
use crate::models::document::Document;
use crate::models::result::{FieldMatch, MatchMethod, StrategyKind, TemplateMatchResult};
use crate::models::template::Template;
use crate::registry::TemplateRegistry;

/// Template id reported by the generic fallback result.
pub const FALLBACK_TEMPLATE_ID: &str = "fallback_template";

/// Evaluates every template with every strategy and keeps the best result.
///
/// Ties go to the earlier template in registry order, then to the earlier
/// strategy (exact, fuzzy, position, combined). The winner is refined; when
/// nothing clears the confidence floor a generic fallback result is returned.
#[derive(Debug, Clone)]
pub struct TemplateSelector {
    config: DocmatchConfig,
    strategies: Vec<Strategy>,
    refiner: Refiner,
}

impl TemplateSelector {
    pub fn new(config: DocmatchConfig) -> Self {
        let strategies = Strategy::all(&config);
        let refiner = Refiner::new(config.refinement.clone());
        Self {
            config,
            strategies,
            refiner,
        }
    }

    pub fn config(&self) -> &DocmatchConfig {
        &self.config
    }

    /// Select, refine and return the best result for `document`.
    pub fn select(&self, document: &Document, registry: &TemplateRegistry) -> TemplateMatchResult {
        let index = DocumentTextIndex::new(document);
        self.select_indexed(&index, registry)
    }

    /// [`select`](Self::select) over a prepared index.
    pub fn select_indexed(
        &self,
        index: &DocumentTextIndex<'_>,
        registry: &TemplateRegistry,
    ) -> TemplateMatchResult {
        let floor = self.config.selection.confidence_floor;

        let best = self
            .evaluate_all(index, registry)
            .into_iter()
            .fold(None::<TemplateMatchResult>, |best, candidate| {
                let better = candidate.confidence > floor
                    && best
                        .as_ref()
                        .is_none_or(|b| candidate.confidence > b.confidence);
                if better { Some(candidate) } else { best }
            });

        match best {
            Some(best) => {
                info!(
                    "Selected template {} via {} ({:.3})",
                    best.template_id, best.strategy_used, best.confidence
                );
                self.refiner.refine(&best, index)
            }
            None => {
                info!("No template above {:.2}, using fallback", floor);
                self.fallback(index)
            }
        }
    }

    /// Every (template, strategy) result in registry order, then strategy order.
    pub fn evaluate_all(
        &self,
        index: &DocumentTextIndex<'_>,
        registry: &TemplateRegistry,
    ) -> Vec<TemplateMatchResult> {
        let templates = registry.templates();

        #[cfg(feature = "parallel")]
        if self.config.selection.parallel {
            return templates
                .par_iter()
                .flat_map_iter(|template| self.evaluate_template(index, template))
                .collect();
        }

        templates
            .iter()
            .flat_map(|template| self.evaluate_template(index, template))
            .collect()
    }

    fn evaluate_template(
        &self,
        index: &DocumentTextIndex<'_>,
        template: &Template,
    ) -> Vec<TemplateMatchResult> {
        self.strategies
            .iter()
            .map(|strategy| {
                let result = strategy.evaluate(index, template);
                debug!(
                    "{} / {}: {:.3}",
                    template.id, result.strategy_used, result.confidence
                );
                result
            })
            .collect()
    }

    /// Run a single strategy on a single template, without refinement.
    pub fn evaluate(
        &self,
        document: &Document,
        template: &Template,
        kind: StrategyKind,
    ) -> TemplateMatchResult {
        let index = DocumentTextIndex::new(document);
        match self.strategies.iter().find(|s| s.kind() == kind) {
            Some(strategy) => strategy.evaluate(&index, template),
            None => Strategy::from_kind(kind, &self.config).evaluate(&index, template),
        }
    }

    /// Generic result built from template-independent patterns.
    pub fn fallback(&self, index: &DocumentTextIndex<'_>) -> TemplateMatchResult {
        let settings = &self.config.fallback;

        let matches: Vec<FieldMatch> = if index.is_empty() {
            Vec::new()
        } else {
            FALLBACK_KINDS
                .iter()
                .filter_map(|kind| {
                    generic_patterns(*kind)
                        .into_iter()
                        .find_map(|re| capture_value(re, index.full_text()))
                        .map(str::trim)
                        .map(|value| {
                            FieldMatch::new(
                                fallback_field_name(*kind),
                                value,
                                settings.field_confidence,
                                MatchMethod::Fallback,
                            )
                        })
                })
                .collect()
        };

        let confidence = if matches.is_empty() {
            settings.empty_confidence
        } else {
            settings.found_confidence
        };

        TemplateMatchResult::new(
            FALLBACK_TEMPLATE_ID,
            FALLBACK_KINDS.iter().map(|kind| fallback_field_name(*kind)),
            matches,
            confidence,
            settings.bbox_accuracy,
            StrategyKind::Exact,
        )
    }
}

impl Default for TemplateSelector {
    fn default() -> Self {
        Self::new(DocmatchConfig::default())
    }
}
