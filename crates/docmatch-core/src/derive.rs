//! Template derivation from a match result.

use tracing::info;

use crate::error::TemplateError;
use crate::matching::patterns::{classify_value, generic_patterns};
use crate::models::document::BoundingBox;
use crate::models::result::TemplateMatchResult;
use crate::models::template::{
    ExtractionMethod, FieldKind, PositionHint, Template, TemplateField,
};

/// Name fragments that mark a field as required.
const REQUIRED_NAME_HINTS: &[&str] = &[
    "document_number",
    "code",
    "title",
    "date",
    "문서번호",
    "제목",
    "날짜",
];

/// Build a reusable template from the fields a match found.
///
/// Kinds are guessed from the values, required flags from the field names and
/// position hints from the bounding boxes. Code, date and version fields get
/// the generic patterns for their kind; other fields are located by position
/// when a box is known.
pub fn derive_template(
    result: &TemplateMatchResult,
    document_name: &str,
    document_type: &str,
) -> Result<Template, TemplateError> {
    let fields = result
        .matched_fields
        .iter()
        .map(|(name, matched)| {
            let kind = classify_value(&matched.value);
            let patterns: Vec<&str> = match kind {
                FieldKind::Code | FieldKind::Date | FieldKind::Version => generic_patterns(kind)
                    .into_iter()
                    .map(|re| re.as_str())
                    .collect(),
                _ => Vec::new(),
            };

            let method = if !patterns.is_empty() {
                ExtractionMethod::Pattern
            } else if matched.bbox.is_some() {
                ExtractionMethod::Position
            } else {
                ExtractionMethod::Inference
            };

            let mut field = TemplateField::new(name, kind)
                .with_patterns(patterns)
                .with_required(is_required_name(name))
                .with_extraction_method(method);
            if let Some(bbox) = &matched.bbox {
                field = field.with_position_hint(hint_from_bbox(bbox));
            }
            field
        })
        .collect();

    let template = Template::new(
        format!("{document_name}_template"),
        format!("{document_name}_template"),
        document_type,
        fields,
    )?
    .with_description(format!(
        "Derived from {} (matched with {})",
        document_name, result.template_id
    ));

    info!(
        "Derived template {} with {} fields",
        template.id,
        template.fields().len()
    );
    Ok(template)
}

fn is_required_name(name: &str) -> bool {
    let name = name.to_lowercase();
    REQUIRED_NAME_HINTS.iter().any(|hint| name.contains(hint))
}

/// Vertical range widened by one box height on each side, floored at zero.
fn hint_from_bbox(bbox: &BoundingBox) -> PositionHint {
    let height = bbox.height();
    PositionHint::new((bbox.y1 - height).max(0.0), bbox.y2 + height, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::{FieldMatch, MatchMethod, StrategyKind};
    use pretty_assertions::assert_eq;

    fn result() -> TemplateMatchResult {
        let bbox = BoundingBox::new(50.0, 20.0, 400.0, 50.0, 1);
        TemplateMatchResult::new(
            "technical_standard_v1",
            ["document_number", "revision", "author", "summary", "title"],
            vec![
                FieldMatch::new("document_number", "TP-030-030-050", 1.0, MatchMethod::Exact)
                    .with_bbox(bbox),
                FieldMatch::new("revision", "Rev.10", 1.0, MatchMethod::Exact),
                FieldMatch::new("author", "김철수", 0.95, MatchMethod::Metadata),
                FieldMatch::new("summary", "본 문서는 압연 공정을 다룬다", 0.7, MatchMethod::Position)
                    .with_bbox(BoundingBox::new(50.0, 300.0, 400.0, 320.0, 1)),
                FieldMatch::new("title", "압연 작업 기준", 1.0, MatchMethod::Position)
                    .with_bbox(BoundingBox::new(50.0, 150.0, 400.0, 190.0, 1)),
            ],
            0.8,
            0.5,
            StrategyKind::Combined,
        )
    }

    #[test]
    fn test_derived_fields() {
        let template = derive_template(&result(), "rolling", "docx").unwrap();
        assert_eq!(template.id, "rolling_template");
        assert_eq!(template.document_type, "docx");

        let number = template.field("document_number").unwrap();
        assert_eq!(number.kind, FieldKind::Code);
        assert!(number.required);
        assert_eq!(number.extraction_method, ExtractionMethod::Pattern);
        assert!(!number.patterns.is_empty());
        assert_eq!(number.position_hint, Some(PositionHint::new(0.0, 80.0, 30.0)));

        let revision = template.field("revision").unwrap();
        assert_eq!(revision.kind, FieldKind::Version);
        assert!(!revision.required);
        assert!(revision.position_hint.is_none());

        let author = template.field("author").unwrap();
        assert_eq!(author.kind, FieldKind::Text);
        assert_eq!(author.extraction_method, ExtractionMethod::Inference);

        let summary = template.field("summary").unwrap();
        assert_eq!(summary.extraction_method, ExtractionMethod::Position);
        assert!(summary.patterns.is_empty());

        let title = template.field("title").unwrap();
        assert_eq!(title.kind, FieldKind::Title);
        assert!(title.required);
        assert!(title.patterns.is_empty());
        assert_eq!(title.extraction_method, ExtractionMethod::Position);
    }

    #[test]
    fn test_derived_template_finds_its_own_values() {
        use crate::matching::{DocumentTextIndex, ExactPatternMatcher, TemplateMatcher};
        use crate::models::document::{Block, Document};

        let template = derive_template(&result(), "rolling", "docx").unwrap();
        let document = Document::from_blocks(vec![Block::new("TP-030-030-050 Rev.10")]);
        let index = DocumentTextIndex::new(&document);
        let matched = ExactPatternMatcher::new().evaluate(&index, &template);
        assert_eq!(matched.value("document_number"), Some("TP-030-030-050"));
        assert_eq!(matched.value("revision"), Some("10"));
    }
}
