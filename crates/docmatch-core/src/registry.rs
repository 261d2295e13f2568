//! Caller-owned collection of templates.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::TemplateError;
use crate::models::embedded::builtin_templates;
use crate::models::template::{Template, TemplateDefinition};

/// Templates in declaration order, unique by id.
///
/// Declaration order is the selection tie-break order. The registry is read
/// only while a selection runs; callers own its lifecycle.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

/// Summary counts over a registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistryStats {
    pub template_count: usize,
    pub field_count: usize,
    pub required_field_count: usize,
    pub by_document_type: BTreeMap<String, usize>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the embedded templates.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for template in builtin_templates() {
            if let Err(e) = registry.insert(template) {
                warn!("Skipping built-in template: {}", e);
            }
        }
        registry
    }

    pub fn from_templates(templates: Vec<Template>) -> Result<Self, TemplateError> {
        let mut registry = Self::new();
        for template in templates {
            registry.insert(template)?;
        }
        Ok(registry)
    }

    pub fn from_definitions(definitions: Vec<TemplateDefinition>) -> Result<Self, TemplateError> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.insert(Template::from_definition(definition)?)?;
        }
        Ok(registry)
    }

    /// Append a template. Ids must be unique.
    pub fn insert(&mut self, template: Template) -> Result<(), TemplateError> {
        if self.get(&template.id).is_some() {
            return Err(TemplateError::DuplicateTemplate(template.id));
        }
        debug!(
            "Registered template {} ({} fields)",
            template.id,
            template.fields().len()
        );
        self.templates.push(template);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Remove a template, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<Template> {
        let position = self.templates.iter().position(|t| t.id == id)?;
        Some(self.templates.remove(position))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    /// Templates in declaration order.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn by_document_type<'a>(
        &'a self,
        document_type: &'a str,
    ) -> impl Iterator<Item = &'a Template> + 'a {
        self.templates
            .iter()
            .filter(move |t| t.document_type == document_type)
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            template_count: self.templates.len(),
            ..RegistryStats::default()
        };
        for template in &self.templates {
            stats.field_count += template.fields().len();
            stats.required_field_count += template.fields().iter().filter(|f| f.required).count();
            *stats
                .by_document_type
                .entry(template.document_type.clone())
                .or_default() += 1;
        }
        stats
    }
}

impl<'a> IntoIterator for &'a TemplateRegistry {
    type Item = &'a Template;
    type IntoIter = std::slice::Iter<'a, Template>;

    fn into_iter(self) -> Self::IntoIter {
        self.templates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::{FieldKind, TemplateField};
    use pretty_assertions::assert_eq;

    fn template(id: &str, document_type: &str) -> Template {
        Template::new(
            id,
            id,
            document_type,
            vec![
                TemplateField::new("a", FieldKind::Code),
                TemplateField::new("b", FieldKind::Text).with_required(false),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_insert_and_order() {
        let registry = TemplateRegistry::from_templates(vec![
            template("one", "docx"),
            template("two", "pdf"),
            template("three", "docx"),
        ])
        .unwrap();

        let ids: Vec<&str> = registry.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two", "three"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.by_document_type("docx").count(), 2);
        assert!(registry.get("two").is_some());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = TemplateRegistry::new();
        registry.insert(template("one", "docx")).unwrap();
        assert_eq!(
            registry.insert(template("one", "pdf")),
            Err(TemplateError::DuplicateTemplate("one".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut registry = TemplateRegistry::from_templates(vec![
            template("one", "docx"),
            template("two", "docx"),
            template("three", "docx"),
        ])
        .unwrap();
        assert!(registry.remove("two").is_some());
        assert!(registry.remove("missing").is_none());
        let ids: Vec<&str> = registry.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "three"]);
    }

    #[test]
    fn test_stats() {
        let registry =
            TemplateRegistry::from_templates(vec![template("one", "docx"), template("two", "pdf")])
                .unwrap();
        let stats = registry.stats();
        assert_eq!(stats.template_count, 2);
        assert_eq!(stats.field_count, 4);
        assert_eq!(stats.required_field_count, 2);
        assert_eq!(stats.by_document_type.get("pdf"), Some(&1));
    }

    #[test]
    fn test_builtin() {
        let registry = TemplateRegistry::with_builtin();
        assert!(registry.get("technical_standard_v1").is_some());
    }
}
