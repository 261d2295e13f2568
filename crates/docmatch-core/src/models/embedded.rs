//! Built-in template definitions compiled into the binary.

use tracing::warn;

use super::template::Template;

/// Technical standard template (document number, effective date, revision...).
pub static TECHNICAL_STANDARD_V1: &str =
    include_str!("../../../../templates/technical_standard_v1.json");

/// All embedded definitions, in registry order.
pub static BUILTIN_DEFINITIONS: &[(&str, &str)] =
    &[("technical_standard_v1", TECHNICAL_STANDARD_V1)];

/// Build every embedded template that parses.
pub fn builtin_templates() -> Vec<Template> {
    BUILTIN_DEFINITIONS
        .iter()
        .filter_map(|(name, json)| match Template::from_json(json) {
            Ok(template) => Some(template),
            Err(e) => {
                warn!("Embedded template {} is invalid: {}", name, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_parse() {
        let templates = builtin_templates();
        assert_eq!(templates.len(), BUILTIN_DEFINITIONS.len());

        let standard = &templates[0];
        assert_eq!(standard.id, "technical_standard_v1");
        assert!(standard.field("document_number").is_some());
        assert!(standard.fields().iter().all(|f| f.skipped_patterns() == 0));
    }
}
