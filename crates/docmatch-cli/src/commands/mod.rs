//! CLI command implementations.

pub mod config;
pub mod match_cmd;
pub mod templates;

use std::path::{Path, PathBuf};

use anyhow::Context;
use glob::glob;
use tracing::debug;

use docmatch_core::{DocmatchConfig, Template, TemplateRegistry};

/// Load configuration from an explicit path, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocmatchConfig> {
    if let Some(path) = config_path {
        return DocmatchConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(DocmatchConfig::from_file(&default_path)?)
    } else {
        Ok(DocmatchConfig::default())
    }
}

/// Template definition files in a directory, sorted by path.
pub fn template_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Template directory not found: {}", dir.display());
    }

    let pattern = dir.join("*.json");
    let mut files: Vec<PathBuf> = glob(&pattern.to_string_lossy())?
        .filter_map(|r| r.ok())
        .collect();
    files.sort();
    Ok(files)
}

/// Parse one template definition file.
pub fn load_template(path: &Path) -> anyhow::Result<Template> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Template::from_json(&content).with_context(|| format!("Invalid template {}", path.display()))
}

/// Build a registry from built-in templates (first) and a template directory.
pub fn load_registry(dir: Option<&Path>, builtin: bool) -> anyhow::Result<TemplateRegistry> {
    let mut registry = if builtin {
        TemplateRegistry::with_builtin()
    } else {
        TemplateRegistry::new()
    };

    if let Some(dir) = dir {
        for path in template_files(dir)? {
            let template = load_template(&path)?;
            registry
                .insert(template)
                .with_context(|| format!("Cannot register {}", path.display()))?;
        }
    }

    debug!("Loaded {} templates", registry.len());
    Ok(registry)
}
