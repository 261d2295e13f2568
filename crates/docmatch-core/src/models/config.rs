//! Configuration structures for the matching engine.
//!
//! Every weight and threshold the engine uses lives here, with the observed
//! production values as defaults.

use serde::{Deserialize, Serialize};

use super::template::{FieldKind, PositionHint};

/// Main configuration for docmatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocmatchConfig {
    /// Per-strategy scoring parameters.
    pub strategy: StrategyConfig,

    /// Ensemble weighting.
    pub ensemble: EnsembleConfig,

    /// Template selection.
    pub selection: SelectionConfig,

    /// Refinement pass (metadata integration, bbox estimation).
    pub refinement: RefinementConfig,

    /// Fallback result when no template is confident enough.
    pub fallback: FallbackConfig,

    /// Default vertical regions per field kind.
    pub positions: PositionProfiles,
}

/// Scoring parameters for the individual strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Weight of a required field in the exact-pattern aggregate.
    pub required_weight: f32,

    /// Weight of an optional field in the exact-pattern aggregate.
    pub optional_weight: f32,

    /// Minimum keyword coverage for a fuzzy candidate.
    pub fuzzy_threshold: f32,

    /// Multiplier applied to the fuzzy aggregate confidence.
    pub fuzzy_penalty: f32,

    /// Flat bbox accuracy reported by the fuzzy strategy.
    pub fuzzy_bbox_accuracy: f32,

    /// Weight of the vertical-range score.
    pub position_y_weight: f32,

    /// Weight of the height-similarity score.
    pub position_height_weight: f32,

    /// Minimum position score for a candidate.
    pub position_threshold: f32,

    /// Multiplier applied to the position aggregate confidence.
    pub position_penalty: f32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            required_weight: 2.0,
            optional_weight: 1.0,
            fuzzy_threshold: 0.3,
            fuzzy_penalty: 0.8,
            fuzzy_bbox_accuracy: 0.6,
            position_y_weight: 0.7,
            position_height_weight: 0.3,
            position_threshold: 0.3,
            position_penalty: 0.7,
        }
    }
}

/// Weights for merging strategy aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub exact_weight: f32,
    pub fuzzy_weight: f32,
    pub position_weight: f32,
    pub exact_bbox_weight: f32,
    pub fuzzy_bbox_weight: f32,
    pub position_bbox_weight: f32,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            exact_weight: 0.4,
            fuzzy_weight: 0.3,
            position_weight: 0.3,
            exact_bbox_weight: 0.2,
            fuzzy_bbox_weight: 0.3,
            position_bbox_weight: 0.5,
        }
    }
}

/// Template selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Results must score strictly above this to be considered.
    pub confidence_floor: f32,

    /// Evaluate templates on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.1,
            parallel: true,
        }
    }
}

/// Refinement pass settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    /// Minimum text similarity for a block to donate its bbox.
    pub similarity_threshold: f32,

    /// Confidence bonus per unit of bbox coverage.
    pub bbox_bonus: f32,

    /// Confidence of values taken from document metadata.
    pub metadata_confidence: f32,

    /// Confidence of values taken from process-flow steps.
    pub process_flow_confidence: f32,

    /// Weight of bbox coverage in the recomputed bbox accuracy.
    pub coverage_weight: f32,

    /// Weight of bbox quality in the recomputed bbox accuracy.
    pub quality_weight: f32,

    /// Plausible text box width range.
    pub width_range: (f32, f32),

    /// Plausible text box height range.
    pub height_range: (f32, f32),
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            bbox_bonus: 0.2,
            metadata_confidence: 0.95,
            process_flow_confidence: 0.90,
            coverage_weight: 0.7,
            quality_weight: 0.3,
            width_range: (5.0, 800.0),
            height_range: (5.0, 100.0),
        }
    }
}

/// Fallback result settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub found_confidence: f32,
    pub empty_confidence: f32,
    pub bbox_accuracy: f32,
    pub field_confidence: f32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            found_confidence: 0.4,
            empty_confidence: 0.1,
            bbox_accuracy: 0.2,
            field_confidence: 0.6,
        }
    }
}

/// Default vertical page regions used when a field has no own position hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionProfiles {
    pub header: PositionHint,
    pub title: PositionHint,
    pub content: PositionHint,
    pub footer: PositionHint,
}

impl Default for PositionProfiles {
    fn default() -> Self {
        Self {
            header: PositionHint::new(0.0, 150.0, 30.0),
            title: PositionHint::new(100.0, 250.0, 40.0),
            content: PositionHint::new(200.0, 800.0, 20.0),
            footer: PositionHint::new(750.0, 850.0, 25.0),
        }
    }
}

impl PositionProfiles {
    /// Region expected for a field kind.
    pub fn for_kind(&self, kind: FieldKind) -> &PositionHint {
        match kind {
            FieldKind::Code | FieldKind::Date | FieldKind::Version | FieldKind::Header => {
                &self.header
            }
            FieldKind::Title => &self.title,
            FieldKind::Text => &self.content,
        }
    }
}

impl DocmatchConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would break the [0, 1] confidence contract.
    pub fn validate(&self) -> crate::Result<()> {
        let unit = [
            ("strategy.fuzzy_threshold", self.strategy.fuzzy_threshold),
            ("strategy.fuzzy_penalty", self.strategy.fuzzy_penalty),
            ("strategy.fuzzy_bbox_accuracy", self.strategy.fuzzy_bbox_accuracy),
            ("strategy.position_threshold", self.strategy.position_threshold),
            ("strategy.position_penalty", self.strategy.position_penalty),
            ("selection.confidence_floor", self.selection.confidence_floor),
            ("refinement.similarity_threshold", self.refinement.similarity_threshold),
            ("refinement.metadata_confidence", self.refinement.metadata_confidence),
            ("refinement.process_flow_confidence", self.refinement.process_flow_confidence),
            ("fallback.found_confidence", self.fallback.found_confidence),
            ("fallback.empty_confidence", self.fallback.empty_confidence),
            ("fallback.bbox_accuracy", self.fallback.bbox_accuracy),
            ("fallback.field_confidence", self.fallback.field_confidence),
        ];
        if let Some((key, value)) = unit.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            return Err(crate::DocmatchError::Config(format!(
                "{key} must be within [0, 1], got {value}"
            )));
        }

        if self.strategy.required_weight <= 0.0 || self.strategy.optional_weight <= 0.0 {
            return Err(crate::DocmatchError::Config(
                "field weights must be positive".to_string(),
            ));
        }

        let sum = |w: &[f32]| w.iter().sum::<f32>();
        let weight_sets = [
            (
                "strategy position weights",
                sum(&[
                    self.strategy.position_y_weight,
                    self.strategy.position_height_weight,
                ]),
            ),
            (
                "ensemble confidence weights",
                sum(&[
                    self.ensemble.exact_weight,
                    self.ensemble.fuzzy_weight,
                    self.ensemble.position_weight,
                ]),
            ),
            (
                "ensemble bbox weights",
                sum(&[
                    self.ensemble.exact_bbox_weight,
                    self.ensemble.fuzzy_bbox_weight,
                    self.ensemble.position_bbox_weight,
                ]),
            ),
            (
                "refinement accuracy weights",
                sum(&[self.refinement.coverage_weight, self.refinement.quality_weight]),
            ),
        ];
        if let Some((name, total)) = weight_sets.iter().find(|(_, t)| *t > 1.0 + 1e-6) {
            return Err(crate::DocmatchError::Config(format!(
                "{name} sum to {total}, expected at most 1.0"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DocmatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DocmatchConfig =
            serde_json::from_str(r#"{"selection": {"confidence_floor": 0.25}}"#).unwrap();
        assert_eq!(config.selection.confidence_floor, 0.25);
        assert!(config.selection.parallel);
        assert_eq!(config.ensemble, EnsembleConfig::default());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut config = DocmatchConfig::default();
        config.fallback.found_confidence = 1.5;
        assert!(config.validate().is_err());

        let mut config = DocmatchConfig::default();
        config.ensemble.exact_weight = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_kind_regions() {
        let profiles = PositionProfiles::default();
        assert_eq!(profiles.for_kind(FieldKind::Date), &profiles.header);
        assert_eq!(profiles.for_kind(FieldKind::Title), &profiles.title);
        assert_eq!(profiles.for_kind(FieldKind::Text), &profiles.content);
    }
}
