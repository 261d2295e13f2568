use tracing::trace;

use super::{DocumentTextIndex, text_similarity};
use crate::models::document::BoundingBox;
use crate::models::result::TemplateMatchResult;

/// Locates bounding boxes for matched values that came without one.
#[derive(Debug, Clone)]
pub struct BboxEstimator {
    threshold: f32,
}

impl BboxEstimator {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Box of the block whose text best resembles `value`.
    ///
    /// Body blocks are searched before header and footer blocks; the first
    /// block with the highest score wins.
    pub fn locate(&self, value: &str, index: &DocumentTextIndex<'_>) -> Option<BoundingBox> {
        let mut best: Option<(BoundingBox, f32)> = None;

        for block in index.blocks().iter().chain(index.margin_blocks()) {
            let Some(bbox) = block.bbox else {
                continue;
            };
            let score = text_similarity(value, block.text);
            if score >= self.threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((bbox, score));
            }
        }

        best.map(|(bbox, score)| {
            trace!("Located '{}' with similarity {:.2}", value, score);
            bbox
        })
    }

    /// Fill in boxes for matched fields that lack one.
    pub fn estimate(
        &self,
        mut result: TemplateMatchResult,
        index: &DocumentTextIndex<'_>,
    ) -> TemplateMatchResult {
        for field in result.matched_fields.values_mut() {
            if field.bbox.is_none() {
                field.bbox = self.locate(&field.value, index);
            }
        }
        result
    }
}

impl Default for BboxEstimator {
    fn default() -> Self {
        Self::new(0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::*;
    use crate::models::document::{Block, Document};
    use crate::models::result::{FieldMatch, MatchMethod, StrategyKind};

    #[test]
    fn test_locate_best_block() {
        let document = standard_document();
        let index = DocumentTextIndex::new(&document);
        let bbox = BboxEstimator::default().locate("25.07.28", &index);
        assert_eq!(bbox.map(|b| b.y1), Some(60.0));

        assert!(BboxEstimator::default().locate("nothing like it", &index).is_none());
    }

    #[test]
    fn test_body_before_margins() {
        let mut document = Document::from_blocks(vec![block_at("Rev.10", 300.0, 320.0)]);
        document.headers.push(block_at("Rev.10", 10.0, 30.0));
        let index = DocumentTextIndex::new(&document);
        let bbox = BboxEstimator::default().locate("rev.10", &index).unwrap();
        assert_eq!(bbox.y1, 300.0);
    }

    #[test]
    fn test_margin_blocks_searched() {
        let mut document = Document::from_blocks(vec![Block::new("body without box")]);
        document.footers.push(block_at("Page 3", 800.0, 820.0));
        let index = DocumentTextIndex::new(&document);
        assert!(BboxEstimator::default().locate("page 3", &index).is_some());
    }

    #[test]
    fn test_estimate_keeps_existing_boxes() {
        let document = standard_document();
        let index = DocumentTextIndex::new(&document);
        let existing = BoundingBox::new(1.0, 1.0, 2.0, 2.0, 1).unwrap();
        let result = TemplateMatchResult::new(
            "t",
            ["a", "b"],
            vec![
                FieldMatch::new("a", "TP-030-030-050", 1.0, MatchMethod::Exact),
                FieldMatch::new("b", "x", 1.0, MatchMethod::Position).with_bbox(Some(existing)),
            ],
            1.0,
            0.0,
            StrategyKind::Exact,
        );

        let refined = BboxEstimator::default().estimate(result, &index);
        assert_eq!(refined.field("a").unwrap().bbox.map(|b| b.y1), Some(20.0));
        assert_eq!(refined.field("b").unwrap().bbox, Some(existing));
    }
}
