//! Template and field definitions.
//!
//! A [`Template`] is the in-memory, validated form used by the matchers; patterns
//! are compiled once at construction. [`TemplateDefinition`] is the persisted JSON
//! form exchanged with storage collaborators.

use std::collections::{BTreeMap, HashSet};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::TemplateError;

/// Kind of datum a field holds. Drives the default position region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Document code / number (e.g. `TP-030-030-050`).
    #[serde(alias = "fixed_code")]
    Code,
    Date,
    Version,
    Title,
    #[serde(alias = "structural")]
    Header,
    /// Generic text.
    #[default]
    #[serde(alias = "content", alias = "fixed", alias = "table", alias = "diagram")]
    Text,
}

/// How a template author expects a field to be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    #[default]
    #[serde(alias = "regex")]
    Pattern,
    Position,
    Inference,
}

/// Expected vertical range and typical block height for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHint {
    /// Inclusive `[min, max]` range for the block's vertical midpoint.
    pub y_range: (f32, f32),

    /// Typical block height in page units.
    pub typical_height: f32,
}

impl PositionHint {
    pub fn new(y_min: f32, y_max: f32, typical_height: f32) -> Self {
        Self {
            y_range: (y_min, y_max),
            typical_height,
        }
    }

    /// Range must be ordered and the typical height positive.
    pub fn is_valid(&self) -> bool {
        self.y_range.0.is_finite()
            && self.y_range.1.is_finite()
            && self.y_range.0 <= self.y_range.1
            && self.typical_height.is_finite()
            && self.typical_height > 0.0
    }

    pub fn contains_y(&self, y: f32) -> bool {
        self.y_range.0 <= y && y <= self.y_range.1
    }
}

/// A single named datum a template expects to find.
#[derive(Debug, Clone)]
pub struct TemplateField {
    pub name: String,
    pub kind: FieldKind,
    pub extraction_method: ExtractionMethod,
    /// Pattern sources in declaration order, including ones that failed to compile.
    pub patterns: Vec<String>,
    pub required: bool,
    pub confidence_threshold: f32,
    pub position_hint: Option<PositionHint>,
    compiled: Vec<Regex>,
}

impl TemplateField {
    /// Create a required text field with no patterns.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            extraction_method: ExtractionMethod::Pattern,
            patterns: Vec::new(),
            required: true,
            confidence_threshold: 0.7,
            position_hint: None,
            compiled: Vec::new(),
        }
    }

    /// Append patterns. Invalid ones are logged and skipped during matching.
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            self.push_pattern(pattern.into());
        }
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_position_hint(mut self, hint: PositionHint) -> Self {
        self.position_hint = Some(hint);
        self
    }

    pub fn with_extraction_method(mut self, method: ExtractionMethod) -> Self {
        self.extraction_method = method;
        self
    }

    /// Compiled patterns in declaration order.
    pub fn compiled_patterns(&self) -> &[Regex] {
        &self.compiled
    }

    /// Number of declared patterns that failed to compile.
    pub fn skipped_patterns(&self) -> usize {
        self.patterns.len() - self.compiled.len()
    }

    fn push_pattern(&mut self, pattern: String) {
        match RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
        {
            Ok(re) => self.compiled.push(re),
            Err(e) => warn!(
                "Skipping invalid pattern for field {}: {} ({})",
                self.name, pattern, e
            ),
        }
        self.patterns.push(pattern);
    }
}

/// A named, reusable definition of expected fields for one document type.
#[derive(Debug, Clone)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub document_type: String,
    pub version: String,
    fields: Vec<TemplateField>,
    pub hierarchy_patterns: BTreeMap<String, String>,
    pub metadata_mapping: BTreeMap<String, String>,
}

impl Template {
    /// Build a template, validating field names, thresholds and position hints.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        document_type: impl Into<String>,
        fields: Vec<TemplateField>,
    ) -> Result<Self, TemplateError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TemplateError::EmptyId);
        }

        let mut seen = HashSet::new();
        for (position, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(TemplateError::EmptyFieldName {
                    template: id,
                    position,
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(TemplateError::DuplicateField {
                    template: id,
                    field: field.name.clone(),
                });
            }
            if !(0.0..=1.0).contains(&field.confidence_threshold) {
                return Err(TemplateError::InvalidThreshold {
                    template: id,
                    field: field.name.clone(),
                    value: field.confidence_threshold,
                });
            }
            if field.position_hint.as_ref().is_some_and(|h| !h.is_valid()) {
                return Err(TemplateError::InvalidPositionHint {
                    template: id,
                    field: field.name.clone(),
                });
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            description: String::new(),
            document_type: document_type.into(),
            version: default_version(),
            fields,
            hierarchy_patterns: BTreeMap::new(),
            metadata_mapping: BTreeMap::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Build from the persisted form.
    pub fn from_definition(def: TemplateDefinition) -> Result<Self, TemplateError> {
        let fields = def
            .elements
            .into_iter()
            .map(|el| {
                let mut field = TemplateField::new(el.name, el.element_kind)
                    .with_extraction_method(el.extraction_method)
                    .with_patterns(el.patterns.into_iter().chain(el.alternatives))
                    .with_required(el.required)
                    .with_threshold(el.confidence_threshold);
                field.position_hint = el.position_hints;
                field
            })
            .collect();

        let mut template = Self::new(def.template_id, def.name, def.document_type, fields)?
            .with_description(def.description)
            .with_version(def.version);
        template.hierarchy_patterns = def.hierarchy_patterns;
        template.metadata_mapping = def.metadata_mapping;
        Ok(template)
    }

    /// Convert to the persisted form.
    pub fn to_definition(&self) -> TemplateDefinition {
        TemplateDefinition {
            template_id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            document_type: self.document_type.clone(),
            version: self.version.clone(),
            elements: self
                .fields
                .iter()
                .map(|f| ElementDefinition {
                    name: f.name.clone(),
                    element_kind: f.kind,
                    extraction_method: f.extraction_method,
                    patterns: f.patterns.clone(),
                    alternatives: Vec::new(),
                    required: f.required,
                    confidence_threshold: f.confidence_threshold,
                    position_hints: f.position_hint.clone(),
                })
                .collect(),
            hierarchy_patterns: self.hierarchy_patterns.clone(),
            metadata_mapping: self.metadata_mapping.clone(),
        }
    }

    /// Parse a persisted definition from JSON and build the template.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let def: TemplateDefinition = serde_json::from_str(json)?;
        Ok(Self::from_definition(def)?)
    }
}

/// Persisted template record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub template_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub document_type: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub elements: Vec<ElementDefinition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hierarchy_patterns: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata_mapping: BTreeMap<String, String>,
}

/// Persisted field record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDefinition {
    pub name: String,
    #[serde(default, alias = "element_type")]
    pub element_kind: FieldKind,
    #[serde(default)]
    pub extraction_method: ExtractionMethod,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,
    #[serde(
        default,
        alias = "positions",
        deserialize_with = "deserialize_position_hint"
    )]
    pub position_hints: Option<PositionHint>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_required() -> bool {
    true
}

fn default_threshold() -> f32 {
    0.7
}

/// Accept `{}` or partial objects as "no hint" instead of failing the whole template.
fn deserialize_position_hint<'de, D>(deserializer: D) -> Result<Option<PositionHint>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value::<PositionHint>(v).ok()))
}
