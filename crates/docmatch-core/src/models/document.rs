//! Parsed document input as produced by the upstream parser/OCR stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::trace;

/// A page-relative rectangle locating a piece of text.
///
/// Constructed through [`BoundingBox::new`], which rejects empty or inverted
/// rectangles, so every box held by a [`Block`] satisfies `x2 > x1` and `y2 > y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub page: u32,
}

impl BoundingBox {
    /// Create a bounding box, returning `None` unless `x2 > x1` and `y2 > y1`.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, page: u32) -> Option<Self> {
        let bbox = Self { x1, y1, x2, y2, page };
        bbox.is_valid().then_some(bbox)
    }

    /// Check coordinate ordering and finiteness.
    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite())
            && self.x2 > self.x1
            && self.y2 > self.y1
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Vertical midpoint.
    pub fn center_y(&self) -> f32 {
        (self.y1 + self.y2) / 2.0
    }

    /// Parse a loosely-typed JSON object.
    ///
    /// Coordinates may be numbers or numeric strings. Missing or non-numeric
    /// coordinates, or an inverted rectangle, yield `None`. A missing page
    /// defaults to `default_page`.
    pub fn from_value(value: &Value, default_page: u32) -> Option<Self> {
        let obj = value.as_object()?;
        let coord = |key: &str| -> Option<f32> {
            match obj.get(key)? {
                Value::Number(n) => n.as_f64().map(|v| v as f32),
                Value::String(s) => s.trim().parse::<f32>().ok(),
                _ => None,
            }
        };
        let page = match obj.get("page") {
            Some(Value::Number(n)) => n.as_u64().map(|p| p as u32)?,
            Some(Value::String(s)) => s.trim().parse::<u32>().ok()?,
            Some(Value::Null) | None => default_page,
            Some(_) => return None,
        };

        Self::new(coord("x1")?, coord("y1")?, coord("x2")?, coord("y2")?, page)
    }
}

/// A single text block with an optional position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block text content.
    #[serde(default)]
    pub text: String,

    /// Bounding box; malformed input deserializes to `None`.
    #[serde(default, deserialize_with = "deserialize_lenient_bbox")]
    pub bbox: Option<BoundingBox>,

    /// Page number (1-based). Falls back to the bbox page, then 1.
    #[serde(default)]
    pub page: Option<u32>,

    /// Block type reported by the parser (paragraph, table, heading...).
    #[serde(rename = "type", default)]
    pub block_type: String,
}

impl Block {
    /// Create a block without position information.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bbox: None,
            page: None,
            block_type: String::new(),
        }
    }

    /// Attach a bounding box.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.page.get_or_insert(bbox.page);
        self.bbox = Some(bbox);
        self
    }

    /// Set the block type.
    pub fn with_type(mut self, block_type: impl Into<String>) -> Self {
        self.block_type = block_type.into();
        self
    }

    /// Effective page number.
    pub fn page(&self) -> u32 {
        self.page
            .or_else(|| self.bbox.map(|b| b.page))
            .unwrap_or(1)
    }

    /// Whether the block has no meaningful text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

fn deserialize_lenient_bbox<'de, D>(deserializer: D) -> Result<Option<BoundingBox>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let parsed = BoundingBox::from_value(&raw, 1);
            if parsed.is_none() {
                trace!("Dropping malformed bounding box: {}", raw);
            }
            parsed
        }
    })
}

/// A document section holding an ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            id: None,
            title: None,
            blocks,
        }
    }
}

/// One step of a sequential process flow detected upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    pub sequence: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub marker: String,
}

/// A process-flow descriptor attached to document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSource {
    #[serde(rename = "type", default)]
    pub source_type: String,
    #[serde(default)]
    pub steps: Vec<FlowStep>,
}

impl FlowSource {
    /// Whether this descriptor lists ordered steps.
    pub fn is_sequential(&self) -> bool {
        self.source_type == "sequential"
    }
}

/// Free-form document metadata reported by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Process-flow descriptors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<FlowSource>,

    /// Any other key/value pairs (document_number, author, ...).
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl DocumentMetadata {
    /// Look up a non-empty scalar value rendered as a string.
    pub fn get_text(&self, key: &str) -> Option<String> {
        let text = match self.values.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

/// A parsed document: sections of blocks plus optional page furniture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub sections: Vec<Section>,

    /// Running header blocks.
    #[serde(default)]
    pub headers: Vec<Block>,

    /// Running footer blocks.
    #[serde(default)]
    pub footers: Vec<Block>,

    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Build a single-section document from blocks.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            sections: vec![Section::new(blocks)],
            ..Self::default()
        }
    }

    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Iterate body blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bbox_rejects_inverted() {
        assert!(BoundingBox::new(10.0, 10.0, 5.0, 20.0, 1).is_none());
        assert!(BoundingBox::new(10.0, 10.0, 20.0, 10.0, 1).is_none());
        assert!(BoundingBox::new(10.0, 10.0, 20.0, 30.0, 1).is_some());
    }

    #[test]
    fn test_bbox_from_value_lenient() {
        let bbox = BoundingBox::from_value(&json!({"x1": "10", "y1": 5, "x2": 50.5, "y2": 25}), 3)
            .unwrap();
        assert_eq!(bbox.page, 3);
        assert_eq!(bbox.x1, 10.0);

        assert!(BoundingBox::from_value(&json!({"x1": 10, "y1": 5, "x2": 50}), 1).is_none());
        assert!(BoundingBox::from_value(&json!({"x1": "abc", "y1": 5, "x2": 50, "y2": 9}), 1).is_none());
        assert!(BoundingBox::from_value(&json!([1, 2, 3, 4]), 1).is_none());
    }

    #[test]
    fn test_document_deserialize_malformed_bbox() {
        let doc = Document::from_json(
            r#"{
                "sections": [{
                    "blocks": [
                        {"text": "TP-030-030-050", "bbox": {"x1": 10, "y1": 20, "x2": 200, "y2": 45, "page": 1}, "type": "paragraph"},
                        {"text": "broken", "bbox": {"x1": 10, "y1": 20}, "type": "paragraph"},
                        {"text": "inverted", "bbox": {"x1": 10, "y1": 50, "x2": 200, "y2": 45}},
                        {"text": "none", "bbox": null}
                    ]
                }],
                "metadata": {"author": "Kim", "revision": 3}
            }"#,
        )
        .unwrap();

        let blocks: Vec<&Block> = doc.blocks().collect();
        assert_eq!(blocks.len(), 4);
        assert!(blocks[0].bbox.is_some());
        assert!(blocks[1].bbox.is_none());
        assert!(blocks[2].bbox.is_none());
        assert!(blocks[3].bbox.is_none());
        assert_eq!(blocks[0].block_type, "paragraph");
        assert_eq!(doc.metadata.get_text("author"), Some("Kim".to_string()));
        assert_eq!(doc.metadata.get_text("revision"), Some("3".to_string()));
    }

    #[test]
    fn test_block_page_fallback() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0, 4).unwrap();
        assert_eq!(Block::new("x").with_bbox(bbox).page(), 4);
        assert_eq!(Block::new("x").page(), 1);
    }
}
