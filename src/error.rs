//! Error types for the merge engine.
//!
//! Defines [`MergeError`], the unified error type for a merge-scenario
//! computation. Only genuinely fatal conditions live here — a detected
//! conflict is recorded as data and never raised as an error, so the whole
//! scenario can be reported in one pass.

use std::fmt;
use std::path::PathBuf;

use crate::model::types::{ObjectId, RevisionId};

// ---------------------------------------------------------------------------
// MergeError
// ---------------------------------------------------------------------------

/// Unified error type for merge-scenario operations.
#[derive(Debug)]
pub enum MergeError {
    /// The two histories share no common ancestor. This is a precondition
    /// violation for everything downstream, never a "no conflicts" result.
    NoCommonAncestor {
        /// The commit whose changes were to be merged.
        to_merge: RevisionId,
        /// The commit the changes were to be merged into.
        merge_into: RevisionId,
    },

    /// The reconciler was handed feature versions with incompatible schemas.
    /// The classifier must route those to a conflict before reconciling;
    /// reaching this error means the caller skipped that check.
    SchemaMismatch {
        /// Path of the feature being reconciled.
        path: String,
        /// Schema id on the "ours" side.
        ours: ObjectId,
        /// Schema id on the "theirs" side.
        theirs: ObjectId,
    },

    /// An object referenced by a diff stream is missing from the store.
    ObjectNotFound {
        /// The dangling content id.
        id: ObjectId,
    },

    /// A revision named by the caller does not exist.
    RevisionNotFound {
        /// The unknown revision.
        revision: RevisionId,
    },

    /// A configuration file could not be loaded or parsed.
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// An I/O error, e.g. while spilling buffered results to disk.
    Io(std::io::Error),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCommonAncestor {
                to_merge,
                merge_into,
            } => write!(
                f,
                "no common ancestor between {to_merge} and {merge_into}; \
                 the histories are unrelated and cannot be merged"
            ),
            Self::SchemaMismatch { path, ours, theirs } => write!(
                f,
                "cannot reconcile {path}: schemas differ (ours {ours}, theirs {theirs})"
            ),
            Self::ObjectNotFound { id } => write!(f, "object {id} not found in store"),
            Self::RevisionNotFound { revision } => write!(f, "revision {revision} not found"),
            Self::Config { path, detail } => {
                write!(f, "config error in {}: {detail}", path.display())
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MergeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
