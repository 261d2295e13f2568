//! Core library for template matching on parsed documents.
//!
//! This crate provides:
//! - Document and template data models (with the persisted JSON forms)
//! - Exact-pattern, keyword and position matching strategies plus an ensemble
//! - Template selection with a generic fallback result
//! - Refinement: metadata integration and bounding-box estimation
//! - Template derivation from match results

pub mod derive;
pub mod error;
pub mod matching;
pub mod models;
pub mod registry;

pub use derive::derive_template;
pub use error::{DocmatchError, Result, TemplateError};
pub use matching::{
    DocumentTextIndex, EnsembleMatcher, ExactPatternMatcher, KeywordMatcher, PositionMatcher,
    Strategy, TemplateMatcher, TemplateSelector,
};
pub use models::config::DocmatchConfig;
pub use models::document::{Block, BoundingBox, Document, DocumentMetadata, Section};
pub use models::result::{FieldMatch, MatchMethod, StrategyKind, StrategyScores, TemplateMatchResult};
pub use models::template::{
    ElementDefinition, ExtractionMethod, FieldKind, PositionHint, Template, TemplateDefinition,
    TemplateField,
};
pub use registry::{RegistryStats, TemplateRegistry};
