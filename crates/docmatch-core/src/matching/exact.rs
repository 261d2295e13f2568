use tracing::debug;

use super::patterns::capture_value;
use super::{DocumentTextIndex, TemplateMatcher};
use crate::models::config::StrategyConfig;
use crate::models::result::{FieldMatch, MatchMethod, StrategyKind, TemplateMatchResult};
use crate::models::template::{Template, TemplateField};

/// Regex matching over the whole document text.
///
/// Patterns are tried in declaration order and the first one that matches
/// wins, even with an empty capture. Every hit scores 1.0; the aggregate is the weighted
/// share of matched fields, with required fields counting double by default.
#[derive(Debug, Clone)]
pub struct ExactPatternMatcher {
    required_weight: f32,
    optional_weight: f32,
}

impl ExactPatternMatcher {
    pub fn new() -> Self {
        Self::from_config(&StrategyConfig::default())
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            required_weight: config.required_weight,
            optional_weight: config.optional_weight,
        }
    }

    fn weight(&self, field: &TemplateField) -> f32 {
        if field.required {
            self.required_weight
        } else {
            self.optional_weight
        }
    }

    /// Trimmed value of the first pattern that matches `text`.
    ///
    /// A match whose capture is empty still counts.
    pub fn extract_field(field: &TemplateField, text: &str) -> Option<String> {
        field
            .compiled_patterns()
            .iter()
            .find_map(|re| capture_value(re, text))
            .map(|v| v.trim().to_string())
    }
}

impl Default for ExactPatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateMatcher for ExactPatternMatcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Exact
    }

    fn evaluate(&self, index: &DocumentTextIndex<'_>, template: &Template) -> TemplateMatchResult {
        let mut matches = Vec::new();
        let mut total_weight = 0.0;
        let mut matched_weight = 0.0;

        for field in template.fields() {
            let weight = self.weight(field);
            total_weight += weight;

            if index.is_empty() {
                continue;
            }
            if let Some(value) = Self::extract_field(field, index.full_text()) {
                debug!("Exact match for {}.{}: {}", template.id, field.name, value);
                matched_weight += weight;
                matches.push(FieldMatch::new(&field.name, value, 1.0, MatchMethod::Exact));
            }
        }

        let confidence = if total_weight > 0.0 {
            matched_weight / total_weight
        } else {
            0.0
        };

        TemplateMatchResult::new(
            &template.id,
            template.field_names(),
            matches,
            confidence,
            0.0,
            StrategyKind::Exact,
        )
    }
}
