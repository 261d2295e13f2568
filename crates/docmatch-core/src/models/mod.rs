//! Data model: documents, templates, results and configuration.

pub mod config;
pub mod document;
pub mod embedded;
pub mod result;
pub mod template;
