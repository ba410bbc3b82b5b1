//! The shared secret store: a flat `KEY=VALUE` file read by every node's
//! environment merge.
//!
//! The store is seeded once with named-but-empty placeholders and after
//! that only ever read or appended to; an existing file is never
//! overwritten with seed data.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::BootstrapResult;
use crate::topology::Topology;

/// Contents written when the store does not exist yet. The placeholders
/// cover every secret the standard topology declares.
const SEED: &str = "\
# Global environment variables for all KOI-net containers
# This file is used by all containers via the manifest's env_file setting.
# You MUST edit this file to add your actual API tokens before running
# the containers.

# GitHub API token for accessing repository data
# Create one at: https://github.com/settings/tokens
# Required scopes: repo, read:org
GITHUB_TOKEN=

# GitHub webhook secret for validating incoming webhooks
# Can be any random string you create
GITHUB_WEBHOOK_SECRET=

# HackMD API token for accessing note data
# Get this from your HackMD account settings
HACKMD_API_TOKEN=
";

/// Example companion, kept free of real values.
const SEED_EXAMPLE: &str = "\
GITHUB_TOKEN=
HACKMD_API_TOKEN=
GITHUB_WEBHOOK_SECRET=
";

/// The parsed secret store.
#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    values: BTreeMap<String, String>,
}

impl SecretStore {
    /// Load the store from `path`. A missing file yields an empty store;
    /// any other read failure is an error.
    pub fn load(path: &Path) -> BootstrapResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(Self::parse(&content))
    }

    /// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_owned(), value.to_owned());
            }
        }
        Self { values }
    }

    /// The value stored for `key`, if any. Empty placeholders are
    /// returned as `Some("")`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Create the store file with empty placeholders if it does not
    /// exist. Returns whether a file was created; an existing file is
    /// left untouched.
    pub fn seed(path: &Path) -> BootstrapResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, SEED)?;
        info!(path = %path.display(), "seeded secret store with empty placeholders");
        Ok(true)
    }

    /// Create the `.example` companion if it does not exist.
    pub fn seed_example(path: &Path) -> BootstrapResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        fs::write(path, SEED_EXAMPLE)?;
        Ok(true)
    }

    /// Warn about every secret a topology requires that is still an
    /// empty placeholder, and return those keys.
    pub fn report_unset(&self, topology: &Topology) -> Vec<String> {
        let mut unset: Vec<String> = Vec::new();
        for spec in topology.nodes() {
            for (_, key) in spec.secret_requirements() {
                let value = self.get(key).unwrap_or("");
                if value.is_empty() && !unset.iter().any(|k| k == key) {
                    unset.push((*key).to_owned());
                }
            }
        }
        for key in &unset {
            warn!(key = %key, "required secret is not set in the secret store");
        }
        unset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_blanks() {
        let store = SecretStore::parse("# comment\n\nGITHUB_TOKEN=abc123\nEMPTY=\n");
        assert_eq!(store.get("GITHUB_TOKEN"), Some("abc123"));
        assert_eq!(store.get("EMPTY"), Some(""));
        assert_eq!(store.get("comment"), None);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SecretStore::load(&dir.path().join("global.env")).unwrap();
        assert_eq!(store.get("GITHUB_TOKEN"), None);
    }

    #[test]
    fn seed_creates_placeholders_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global.env");

        assert!(SecretStore::seed(&path).unwrap());
        let store = SecretStore::load(&path).unwrap();
        assert_eq!(store.get("GITHUB_TOKEN"), Some(""));
        assert_eq!(store.get("GITHUB_WEBHOOK_SECRET"), Some(""));
        assert_eq!(store.get("HACKMD_API_TOKEN"), Some(""));

        // Second seed must not clobber edits.
        fs::write(&path, "GITHUB_TOKEN=real-value\n").unwrap();
        assert!(!SecretStore::seed(&path).unwrap());
        let store = SecretStore::load(&path).unwrap();
        assert_eq!(store.get("GITHUB_TOKEN"), Some("real-value"));
    }

    #[test]
    fn report_unset_lists_empty_required_keys() {
        let topology = Topology::standard();
        let store = SecretStore::parse("GITHUB_TOKEN=abc\nHACKMD_API_TOKEN=\n");
        let unset = store.report_unset(&topology);
        assert!(unset.contains(&"GITHUB_WEBHOOK_SECRET".to_owned()));
        assert!(unset.contains(&"HACKMD_API_TOKEN".to_owned()));
        assert!(!unset.contains(&"GITHUB_TOKEN".to_owned()));
    }
}
