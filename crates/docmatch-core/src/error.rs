//! Error types for the docmatch-core library.
//!
//! Matching never fails; these errors only surface while building templates,
//! filling a registry, or reading configuration.

use thiserror::Error;

/// Main error type for the docmatch library.
#[derive(Error, Debug)]
pub enum DocmatchError {
    /// Template construction or registry error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while building templates or registering them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// Template id is empty.
    #[error("template id must not be empty")]
    EmptyId,

    /// A field was declared without a name.
    #[error("template {template}: field at position {position} has no name")]
    EmptyFieldName { template: String, position: usize },

    /// Two fields in one template share a name.
    #[error("template {template}: duplicate field name {field}")]
    DuplicateField { template: String, field: String },

    /// Registry already holds a template with this id.
    #[error("duplicate template id: {0}")]
    DuplicateTemplate(String),

    /// Confidence threshold outside [0, 1].
    #[error("template {template}: field {field} has confidence threshold {value} outside [0, 1]")]
    InvalidThreshold {
        template: String,
        field: String,
        value: f32,
    },

    /// Position hint with an empty or inverted range.
    #[error("template {template}: field {field} has an invalid position hint")]
    InvalidPositionHint { template: String, field: String },
}

/// Result type for the docmatch library.
pub type Result<T> = std::result::Result<T, DocmatchError>;
