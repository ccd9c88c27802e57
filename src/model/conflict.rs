//! Conflict records.
//!
//! A [`Conflict`] captures the three competing versions of one path —
//! ancestor, ours, theirs — that could not be reconciled automatically.
//! Conflicts are values, never errors: the scenario keeps running past them
//! so one pass reports the whole merge.
//!
//! Content conflicts carry feature content ids; schema conflicts (two sides
//! changing the shape of the same layer) carry schema ids instead. The two
//! cases are separate variants rather than an overloaded id triple, but both
//! keep the same `ancestor`/`ours`/`theirs` field names so logged conflicts
//! read uniformly.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::ObjectId;

// ---------------------------------------------------------------------------
// ConflictKind
// ---------------------------------------------------------------------------

/// What kind of ids a conflict's three versions are.
///
/// The `NULL` object id stands for "this version did not exist" (e.g. the
/// ancestor of a path both branches created independently).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictKind {
    /// Two irreconcilable versions of a leaf record's content.
    Content {
        ancestor: ObjectId,
        ours: ObjectId,
        theirs: ObjectId,
    },
    /// Two sides changed the same layer to different schemas.
    Schema {
        ancestor: ObjectId,
        ours: ObjectId,
        theirs: ObjectId,
    },
}

impl ConflictKind {
    /// The ancestor-side id, whichever variant.
    #[must_use]
    pub const fn ancestor(&self) -> &ObjectId {
        match self {
            Self::Content { ancestor, .. } | Self::Schema { ancestor, .. } => ancestor,
        }
    }

    /// The ours-side id, whichever variant.
    #[must_use]
    pub const fn ours(&self) -> &ObjectId {
        match self {
            Self::Content { ours, .. } | Self::Schema { ours, .. } => ours,
        }
    }

    /// The theirs-side id, whichever variant.
    #[must_use]
    pub const fn theirs(&self) -> &ObjectId {
        match self {
            Self::Content { theirs, .. } | Self::Schema { theirs, .. } => theirs,
        }
    }
}

// ---------------------------------------------------------------------------
// Conflict
// ---------------------------------------------------------------------------

/// A record of three competing versions of the same path.
///
/// Immutable value type; equality is by path and all three ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Full path of the contested node.
    pub path: String,
    /// Content or schema ids of the three versions.
    pub kind: ConflictKind,
}

impl Conflict {
    /// A content conflict on a leaf record.
    #[must_use]
    pub fn content(path: &str, ancestor: ObjectId, ours: ObjectId, theirs: ObjectId) -> Self {
        Self {
            path: path.to_owned(),
            kind: ConflictKind::Content {
                ancestor,
                ours,
                theirs,
            },
        }
    }

    /// A schema conflict on a layer.
    #[must_use]
    pub fn schema(path: &str, ancestor: ObjectId, ours: ObjectId, theirs: ObjectId) -> Self {
        Self {
            path: path.to_owned(),
            kind: ConflictKind::Schema {
                ancestor,
                ours,
                theirs,
            },
        }
    }

    /// Returns `true` if this is a schema (structural) conflict.
    #[must_use]
    pub const fn is_schema(&self) -> bool {
        matches!(self.kind, ConflictKind::Schema { .. })
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.is_schema() { "schema" } else { "content" };
        write!(
            f,
            "{}: {} conflict (ancestor {}, ours {}, theirs {})",
            self.path,
            label,
            self.kind.ancestor(),
            self.kind.ours(),
            self.kind.theirs()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
