//! Flattened, read-only view of a document used by every matcher.

use crate::models::document::{Block, BoundingBox, Document, DocumentMetadata};

/// Where a block sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRegion {
    Body,
    Header,
    Footer,
}

/// A non-blank block with its position, in document order.
#[derive(Debug, Clone, Copy)]
pub struct IndexedBlock<'a> {
    pub text: &'a str,
    pub bbox: Option<BoundingBox>,
    pub page: u32,
    pub region: BlockRegion,
}

impl<'a> IndexedBlock<'a> {
    fn from_block(block: &'a Block, region: BlockRegion) -> Self {
        Self {
            text: block.text.as_str(),
            bbox: block.bbox.filter(BoundingBox::is_valid),
            page: block.page(),
            region,
        }
    }
}

/// Text index over a [`Document`].
///
/// `full_text` joins body, header and footer text with single spaces for
/// whole-document regex search. `blocks` holds the non-blank body blocks and
/// `margin_blocks` the non-blank header/footer blocks.
#[derive(Debug, Clone)]
pub struct DocumentTextIndex<'a> {
    full_text: String,
    blocks: Vec<IndexedBlock<'a>>,
    margin_blocks: Vec<IndexedBlock<'a>>,
    metadata: &'a DocumentMetadata,
}

impl<'a> DocumentTextIndex<'a> {
    pub fn new(document: &'a Document) -> Self {
        let blocks: Vec<IndexedBlock<'a>> = document
            .blocks()
            .filter(|b| !b.is_blank())
            .map(|b| IndexedBlock::from_block(b, BlockRegion::Body))
            .collect();

        let margin_blocks: Vec<IndexedBlock<'a>> = document
            .headers
            .iter()
            .map(|b| (b, BlockRegion::Header))
            .chain(document.footers.iter().map(|b| (b, BlockRegion::Footer)))
            .filter(|(b, _)| !b.is_blank())
            .map(|(b, region)| IndexedBlock::from_block(b, region))
            .collect();

        let full_text = blocks
            .iter()
            .chain(margin_blocks.iter())
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            full_text,
            blocks,
            margin_blocks,
            metadata: &document.metadata,
        }
    }

    /// All text joined with single spaces.
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Non-blank body blocks in document order.
    pub fn blocks(&self) -> &[IndexedBlock<'a>] {
        &self.blocks
    }

    /// Non-blank header then footer blocks.
    pub fn margin_blocks(&self) -> &[IndexedBlock<'a>] {
        &self.margin_blocks
    }

    /// Body blocks that carry a usable bounding box.
    pub fn positioned_blocks(&self) -> impl Iterator<Item = (&IndexedBlock<'a>, BoundingBox)> {
        self.blocks.iter().filter_map(|b| b.bbox.map(|bbox| (b, bbox)))
    }

    pub fn metadata(&self) -> &'a DocumentMetadata {
        self.metadata
    }

    /// True when the document has no searchable text.
    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::Section;

    fn bbox(y1: f32, y2: f32) -> BoundingBox {
        BoundingBox::new(10.0, y1, 200.0, y2, 1).unwrap()
    }

    #[test]
    fn test_full_text_and_blocks() {
        let document = Document {
            sections: vec![
                Section::new(vec![Block::new("TP-030-030-050"), Block::new("   ")]),
                Section::new(vec![Block::new("1. 목적").with_bbox(bbox(200.0, 220.0))]),
            ],
            headers: vec![Block::new("Rev.10")],
            footers: vec![Block::new("")],
            ..Document::default()
        };
        let index = DocumentTextIndex::new(&document);

        assert_eq!(index.full_text(), "TP-030-030-050 1. 목적 Rev.10");
        assert_eq!(index.blocks().len(), 2);
        assert_eq!(index.margin_blocks().len(), 1);
        assert_eq!(index.margin_blocks()[0].region, BlockRegion::Header);
        assert_eq!(index.positioned_blocks().count(), 1);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_blank_document() {
        let document = Document::from_blocks(vec![Block::new("  "), Block::new("\n")]);
        let index = DocumentTextIndex::new(&document);
        assert!(index.is_empty());
        assert!(index.blocks().is_empty());
    }

    #[test]
    fn test_invalid_bbox_dropped() {
        let mut block = Block::new("x");
        block.bbox = Some(BoundingBox {
            x1: 10.0,
            y1: 50.0,
            x2: 5.0,
            y2: 60.0,
            page: 1,
        });
        let document = Document::from_blocks(vec![block]);
        let index = DocumentTextIndex::new(&document);
        assert!(index.blocks()[0].bbox.is_none());
    }
}
