//! Config synthesis: serializing completed documents to each node's
//! configuration location.
//!
//! Documents are regenerated in full on every run; a prior file at the
//! target path is replaced unconditionally. Re-running with an unchanged
//! registry, mode, and port table produces byte-identical output.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::document::ConfigDocument;
use crate::error::BootstrapResult;

/// File name of the per-node configuration document.
pub const CONFIG_FILE: &str = "config.yaml";

/// Serialize a document to YAML.
pub fn render(doc: &ConfigDocument) -> BootstrapResult<String> {
    Ok(serde_yaml::to_string(doc)?)
}

/// Write a document into a node's repository directory, replacing any
/// existing file.
pub fn write_document(doc: &ConfigDocument, repo_dir: &Path) -> BootstrapResult<PathBuf> {
    let path = repo_dir.join(CONFIG_FILE);
    let rendered = render(doc)?;
    fs::write(&path, rendered)?;
    info!(path = %path.display(), "wrote configuration document");
    Ok(path)
}
