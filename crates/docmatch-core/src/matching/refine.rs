//! Post-selection refinement: metadata integration, bounding-box estimation
//! and score adjustment.

use tracing::debug;

use super::{BboxEstimator, DocumentTextIndex};
use crate::models::config::RefinementConfig;
use crate::models::document::{BoundingBox, DocumentMetadata};
use crate::models::result::{FieldMatch, MatchMethod, TemplateMatchResult, clamp_unit};

/// Field names that can be filled from document metadata, with the keys probed in order.
const METADATA_FIELDS: &[(&str, &[&str])] = &[
    ("document_number", &["document_number", "doc_number"]),
    ("effective_date", &["effective_date", "date"]),
    ("author", &["author", "creator"]),
    ("revision", &["version", "revision"]),
    ("department", &["department", "dept"]),
];

const PROCESS_FLOW_PREFIX: &str = "process_flow_step_";

/// Improves a selected result using everything the strategies do not look at.
#[derive(Debug, Clone)]
pub struct Refiner {
    config: RefinementConfig,
    estimator: BboxEstimator,
}

impl Refiner {
    pub fn new(config: RefinementConfig) -> Self {
        let estimator = BboxEstimator::new(config.similarity_threshold);
        Self { config, estimator }
    }

    /// Produce a refined copy of `result`.
    ///
    /// Missing fields are filled from metadata and process-flow steps, then
    /// boxes are estimated for matched values. Confidence gains a bonus
    /// proportional to bbox coverage and bbox accuracy is recomputed.
    pub fn refine(
        &self,
        result: &TemplateMatchResult,
        index: &DocumentTextIndex<'_>,
    ) -> TemplateMatchResult {
        let base_confidence = result.confidence;

        let refined = self.integrate_metadata(result.clone(), index.metadata());
        let mut refined = self.estimator.estimate(refined, index);

        let coverage = refined.bbox_coverage();
        refined.confidence = clamp_unit(base_confidence + self.config.bbox_bonus * coverage);
        refined.bbox_accuracy = self.bbox_accuracy(&refined);

        debug!(
            "Refined {}: confidence {:.3} -> {:.3}, bbox coverage {:.2}",
            refined.template_id, base_confidence, refined.confidence, coverage
        );
        refined
    }

    /// Fill missing fields from metadata values and sequential process-flow steps.
    pub fn integrate_metadata(
        &self,
        mut result: TemplateMatchResult,
        metadata: &DocumentMetadata,
    ) -> TemplateMatchResult {
        let missing = result.missing_fields.clone();

        for name in missing {
            let filled = if let Some(step) = name.strip_prefix(PROCESS_FLOW_PREFIX) {
                step.parse::<u32>().ok().and_then(|n| {
                    process_flow_step(metadata, n).map(|value| {
                        FieldMatch::new(
                            &name,
                            value,
                            self.config.process_flow_confidence,
                            MatchMethod::ProcessFlow,
                        )
                    })
                })
            } else {
                metadata_value(metadata, &name).map(|value| {
                    FieldMatch::new(
                        &name,
                        value,
                        self.config.metadata_confidence,
                        MatchMethod::Metadata,
                    )
                })
            };

            if let Some(field) = filled {
                debug!("Filled {} from document metadata", name);
                result = result.fill_missing(field);
            }
        }
        result
    }

    /// `coverage_weight * coverage + quality_weight * quality`.
    ///
    /// Quality sums box quality over every matched field, so fields without a
    /// box contribute zero.
    fn bbox_accuracy(&self, result: &TemplateMatchResult) -> f32 {
        let boxes: Vec<&BoundingBox> = result
            .matched_fields
            .values()
            .filter_map(|m| m.bbox.as_ref())
            .collect();
        if boxes.is_empty() {
            return 0.0;
        }

        let quality = boxes.iter().map(|b| self.box_quality(b)).sum::<f32>()
            / result.matched_fields.len() as f32;
        clamp_unit(
            self.config.coverage_weight * result.bbox_coverage()
                + self.config.quality_weight * quality,
        )
    }

    fn box_quality(&self, bbox: &BoundingBox) -> f32 {
        let (min_w, max_w) = self.config.width_range;
        let (min_h, max_h) = self.config.height_range;
        let plausible = (min_w..=max_w).contains(&bbox.width())
            && (min_h..=max_h).contains(&bbox.height());
        if plausible { 1.0 } else { 0.5 }
    }
}

impl Default for Refiner {
    fn default() -> Self {
        Self::new(RefinementConfig::default())
    }
}

fn metadata_value(metadata: &DocumentMetadata, field: &str) -> Option<String> {
    let (_, keys) = METADATA_FIELDS.iter().find(|(name, _)| *name == field)?;
    keys.iter().find_map(|key| metadata.get_text(key))
}

/// `"{marker} {title}"` of the first titled step `n` in a sequential flow.
fn process_flow_step(metadata: &DocumentMetadata, n: u32) -> Option<String> {
    metadata
        .source
        .iter()
        .filter(|s| s.is_sequential())
        .flat_map(|s| s.steps.iter())
        .find(|step| step.sequence == n && !step.title.is_empty())
        .map(|step| format!("{} {}", step.marker, step.title))
}
