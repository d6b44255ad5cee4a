//! Spec document loading and discovery.
//!
//! Loads spec files from disk and turns them into runnable trees.

use crate::schema::SuiteDoc;
use crate::tree::{BuildError, SpecNode};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Error type for spec loading operations. All of these are fatal: a
/// spec file that cannot be loaded aborts the whole run.
#[derive(Debug)]
pub enum LoadError {
    /// Failed to read the file.
    Io(std::io::Error),
    /// Failed to parse YAML.
    Yaml(serde_yaml::Error),
    /// Failed to parse TOML.
    Toml(toml::de::Error),
    /// Unsupported file extension.
    UnsupportedFormat(String),
    /// The document parsed but describes an invalid tree.
    Build(BuildError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "failed to read file: {e}"),
            LoadError::Yaml(e) => write!(f, "invalid YAML: {e}"),
            LoadError::Toml(e) => write!(f, "invalid TOML: {e}"),
            LoadError::UnsupportedFormat(ext) => {
                write!(
                    f,
                    "unsupported file format: {ext} (expected .yaml, .yml, or .toml)"
                )
            }
            LoadError::Build(e) => write!(f, "invalid spec structure: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Yaml(e) => Some(e),
            LoadError::Toml(e) => Some(e),
            LoadError::UnsupportedFormat(_) => None,
            LoadError::Build(e) => Some(e),
        }
    }
}

/// File names that discovery picks up.
static SPEC_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+_spec\.(ya?ml|toml)$").expect("valid pattern"));

/// Load and parse a spec document from a file path.
pub fn load_doc(path: &Path) -> Result<SuiteDoc, LoadError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let contents = std::fs::read_to_string(path).map_err(LoadError::Io)?;

    match ext {
        "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(LoadError::Yaml),
        "toml" => toml::from_str(&contents).map_err(LoadError::Toml),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

/// Load a spec file and build its tree.
pub fn load_spec(path: &Path) -> Result<SpecNode, LoadError> {
    let doc = load_doc(path)?;
    SpecNode::from_doc(&doc).map_err(LoadError::Build)
}

/// Find the spec files of one directory, lexicographically sorted.
///
/// Only direct entries named `*_spec.{yaml,yml,toml}` count; nothing is
/// searched recursively.
pub fn find_specs(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut specs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file()
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
            && SPEC_FILE_NAME.is_match(name)
        {
            specs.push(path);
        }
    }
    specs.sort();
    Ok(specs)
}
