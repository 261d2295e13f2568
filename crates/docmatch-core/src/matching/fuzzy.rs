use tracing::debug;

use super::{DocumentTextIndex, TemplateMatcher};
use crate::models::config::StrategyConfig;
use crate::models::result::{FieldMatch, MatchMethod, StrategyKind, TemplateMatchResult};
use crate::models::template::Template;

/// Lowercase whitespace-separated keywords of a field name.
///
/// `document_number` stays a single keyword, so only blocks naming the
/// field verbatim can score for it.
pub fn field_keywords(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Keyword coverage matching against individual blocks.
///
/// A block scores the share of the field's name keywords it contains. The
/// first block with the highest score at or above the threshold becomes the
/// field's value. Produces no bounding boxes.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    threshold: f32,
    penalty: f32,
    bbox_accuracy: f32,
}

impl KeywordMatcher {
    pub fn new() -> Self {
        Self::from_config(&StrategyConfig::default())
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            threshold: config.fuzzy_threshold,
            penalty: config.fuzzy_penalty,
            bbox_accuracy: config.fuzzy_bbox_accuracy,
        }
    }

    fn best_block<'a>(
        &self,
        keywords: &[String],
        index: &DocumentTextIndex<'a>,
    ) -> Option<(&'a str, f32)> {
        if keywords.is_empty() {
            return None;
        }

        let mut best: Option<(&'a str, f32)> = None;
        for block in index.blocks() {
            let text = block.text.to_lowercase();
            let hits = keywords.iter().filter(|k| text.contains(k.as_str())).count();
            let score = hits as f32 / keywords.len() as f32;

            if score >= self.threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((block.text, score));
            }
        }
        best
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateMatcher for KeywordMatcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Fuzzy
    }

    fn evaluate(&self, index: &DocumentTextIndex<'_>, template: &Template) -> TemplateMatchResult {
        let mut matches = Vec::new();
        let mut total_score = 0.0;

        for field in template.fields() {
            let keywords = field_keywords(&field.name);
            if let Some((text, score)) = self.best_block(&keywords, index) {
                let score = score.min(1.0);
                debug!("Keyword match for {}.{} ({:.2})", template.id, field.name, score);
                total_score += score;
                matches.push(FieldMatch::new(&field.name, text.trim(), score, MatchMethod::Fuzzy));
            }
        }

        let field_count = template.fields().len();
        let confidence = if field_count > 0 {
            total_score / field_count as f32 * self.penalty
        } else {
            0.0
        };

        TemplateMatchResult::new(
            &template.id,
            template.field_names(),
            matches,
            confidence,
            self.bbox_accuracy,
            StrategyKind::Fuzzy,
        )
    }
}
