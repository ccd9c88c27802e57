//! Change records between two tree snapshots.
//!
//! A [`DiffEntry`] describes the before/after state of a single path. The
//! diff streams consumed by the merge engine yield these in ascending path
//! order; [`DiffEntry::compare_paths`] is the ordering the merge-join relies
//! on.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::ObjectId;

// ---------------------------------------------------------------------------
// ChangeType
// ---------------------------------------------------------------------------

/// The kind of change made to a path between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Path did not exist in the old snapshot.
    Added,
    /// Path no longer exists in the new snapshot.
    Removed,
    /// Path exists in both snapshots with different content.
    Modified,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

// ---------------------------------------------------------------------------
// NodeKind / NodeRef
// ---------------------------------------------------------------------------

/// Whether a node is a leaf record or a sub-collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A leaf feature record.
    Feature,
    /// A sub-collection (a layer / feature-type container).
    Tree,
}

/// A reference to one version of a node: its content id plus the id of the
/// schema it conforms to.
///
/// For [`NodeKind::Tree`] nodes `object_id` addresses the tree object and
/// `metadata_id` the layer's default schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// Full path of the node in the tree.
    pub path: String,
    /// Content id of the node.
    pub object_id: ObjectId,
    /// Content id of the schema (metadata) the node conforms to.
    pub metadata_id: ObjectId,
    /// Leaf record or sub-collection.
    pub kind: NodeKind,
}

impl NodeRef {
    #[must_use]
    pub fn feature(path: &str, object_id: ObjectId, metadata_id: ObjectId) -> Self {
        Self {
            path: path.to_owned(),
            object_id,
            metadata_id,
            kind: NodeKind::Feature,
        }
    }

    #[must_use]
    pub fn tree(path: &str, object_id: ObjectId, metadata_id: ObjectId) -> Self {
        Self {
            path: path.to_owned(),
            object_id,
            metadata_id,
            kind: NodeKind::Tree,
        }
    }
}

// ---------------------------------------------------------------------------
// DiffEntry
// ---------------------------------------------------------------------------

/// One change record: the old and new versions of a single path.
///
/// Exactly one of `old`/`new` is absent for [`ChangeType::Added`] and
/// [`ChangeType::Removed`]; both are present for [`ChangeType::Modified`].
/// Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub old: Option<NodeRef>,
    pub new: Option<NodeRef>,
}

impl DiffEntry {
    /// An addition: the path exists only in the new snapshot.
    #[must_use]
    pub const fn added(new: NodeRef) -> Self {
        Self {
            old: None,
            new: Some(new),
        }
    }

    /// A removal: the path exists only in the old snapshot.
    #[must_use]
    pub const fn removed(old: NodeRef) -> Self {
        Self {
            old: Some(old),
            new: None,
        }
    }

    /// A modification: the path exists in both snapshots.
    #[must_use]
    pub const fn modified(old: NodeRef, new: NodeRef) -> Self {
        Self {
            old: Some(old),
            new: Some(new),
        }
    }

    /// The path this entry describes.
    ///
    /// # Panics
    /// Never panics for entries built through the constructors: at least one
    /// side is always present.
    #[must_use]
    pub fn path(&self) -> &str {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .map_or("", |r| r.path.as_str())
    }

    /// The change classification of this entry.
    #[must_use]
    pub const fn change_type(&self) -> ChangeType {
        match (&self.old, &self.new) {
            (None, _) => ChangeType::Added,
            (_, None) => ChangeType::Removed,
            (Some(_), Some(_)) => ChangeType::Modified,
        }
    }

    /// Content id of the old version, or the `NULL` id if absent.
    #[must_use]
    pub fn old_object_id(&self) -> ObjectId {
        self.old
            .as_ref()
            .map_or_else(ObjectId::null, |r| r.object_id.clone())
    }

    /// Content id of the new version, or the `NULL` id if absent.
    #[must_use]
    pub fn new_object_id(&self) -> ObjectId {
        self.new
            .as_ref()
            .map_or_else(ObjectId::null, |r| r.object_id.clone())
    }

    /// Kind of the new version's node, if present.
    #[must_use]
    pub fn new_kind(&self) -> Option<NodeKind> {
        self.new.as_ref().map(|r| r.kind)
    }

    /// Total order by path — the order diff streams are sorted in and the
    /// merge-join compares by.
    #[must_use]
    pub fn compare_paths(&self, other: &Self) -> Ordering {
        self.path().cmp(other.path())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
