//! Merge engine configuration.
//!
//! Typed configuration for a merge-scenario run. Values that were once
//! hard-coded constants — the spill chunk size and the number of conflicts
//! listed individually in merge messages — are configuration here, loadable
//! from a TOML file. Missing fields use defaults; a missing file is all
//! defaults, not an error.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::MergeError;

// ---------------------------------------------------------------------------
// MergeConfig
// ---------------------------------------------------------------------------

/// Tunables for one merge-scenario computation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    /// How many buffered conflicts / unconflicted changes are held in memory
    /// before the chunk spills to a disk-backed scratch file.
    #[serde(default = "default_spill_chunk_size")]
    pub spill_chunk_size: usize,

    /// How many conflicting paths are listed individually in the merge
    /// message before collapsing to an "and N more" summary line.
    #[serde(default = "default_max_reported_conflicts")]
    pub max_reported_conflicts: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            spill_chunk_size: default_spill_chunk_size(),
            max_reported_conflicts: default_max_reported_conflicts(),
        }
    }
}

const fn default_spill_chunk_size() -> usize {
    100_000
}

const fn default_max_reported_conflicts() -> usize {
    25
}

impl MergeConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    /// Returns [`MergeError::Config`] if the file exists but cannot be read
    /// or parsed.
    pub fn load(path: &Path) -> Result<Self, MergeError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| MergeError::Config {
            path: path.to_path_buf(),
            detail: format!("failed to read: {e}"),
        })?;
        toml::from_str(&raw).map_err(|e| MergeError::Config {
            path: path.to_path_buf(),
            detail: format!("failed to parse: {e}"),
        })
    }
}

impl fmt::Display for MergeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "spill_chunk_size={}, max_reported_conflicts={}",
            self.spill_chunk_size, self.max_reported_conflicts
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = MergeConfig::default();
        assert_eq!(cfg.spill_chunk_size, 100_000);
        assert_eq!(cfg.max_reported_conflicts, 25);
    }

    #[test]
    fn missing_file_is_defaults() {
        let cfg = MergeConfig::load(Path::new("/nonexistent/strata.toml")).unwrap();
        assert_eq!(cfg, MergeConfig::default());
    }

    #[test]
    fn parses_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.toml");
        std::fs::write(&path, "max_reported_conflicts = 5\n").unwrap();
        let cfg = MergeConfig::load(&path).unwrap();
        assert_eq!(cfg.max_reported_conflicts, 5);
        assert_eq!(cfg.spill_chunk_size, 100_000);
    }

    #[test]
    fn rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.toml");
        std::fs::write(&path, "bogus = true\n").unwrap();
        assert!(MergeConfig::load(&path).is_err());
    }
}
