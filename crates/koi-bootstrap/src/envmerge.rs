//! Environment merge: reconciling a node's declared secrets against the
//! shared store, into the node's local `.env` file.
//!
//! The merge never erases a populated local value. Lines not addressed by
//! a declared secret pass through verbatim, comments included.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::BootstrapResult;
use crate::secrets::SecretStore;

/// File name of a node's local environment file.
pub const ENV_FILE: &str = ".env";

/// Merge a node's `(logical_name, SECRET_KEY)` requirements into the
/// `.env` file under `repo_dir`.
///
/// Per declared key:
/// - an existing `KEY=` line is overwritten only when the store holds a
///   non-empty value for it;
/// - a missing key is appended with the store's value, or an empty
///   placeholder when the store has none.
///
/// Returns the merged line count, or `None` when the node declares no
/// secrets (no file is touched in that case). Merging twice against an
/// unchanged store yields an unchanged file.
pub fn merge_env_file(
    repo_dir: &Path,
    requirements: &[(&str, &str)],
    store: &SecretStore,
) -> BootstrapResult<Option<usize>> {
    if requirements.is_empty() {
        debug!(dir = %repo_dir.display(), "node declares no secrets, skipping env merge");
        return Ok(None);
    }

    let path = repo_dir.join(ENV_FILE);
    let mut lines: Vec<String> = match fs::read_to_string(&path) {
        Ok(content) => content.lines().map(str::to_owned).collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    for (_, key) in requirements {
        let prefix = format!("{key}=");
        match lines.iter_mut().find(|line| line.starts_with(&prefix)) {
            Some(line) => {
                // Only a populated store value may replace the local one.
                if let Some(value) = store.get(key).filter(|v| !v.is_empty()) {
                    *line = format!("{key}={value}");
                }
            }
            None => {
                let value = store.get(key).unwrap_or("");
                lines.push(format!("{key}={value}"));
            }
        }
    }

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    fs::write(&path, rendered)?;

    info!(path = %path.display(), keys = requirements.len(), "merged environment file");
    Ok(Some(lines.len()))
}
