//! Collaborator contracts for the merge engine.
//!
//! The scenario engine never walks raw tree structures or talks to storage
//! directly; it consumes already-linearized, path-ordered change streams and
//! hands results to caller-supplied sinks. These traits are that boundary:
//! the durable object store, the revision graph, the conflict store, and the
//! working-copy/staging abstractions all live behind them.
//!
//! [`memory`] provides the in-memory reference implementation used by the
//! test suite.

pub mod memory;

use crate::error::MergeError;
use crate::model::conflict::Conflict;
use crate::model::diff::DiffEntry;
use crate::model::feature::{Feature, FeatureInfo, Schema};
use crate::model::types::{ObjectId, RevisionId};

// ---------------------------------------------------------------------------
// PathOrderedDiffStream
// ---------------------------------------------------------------------------

/// An ordered, lazy, closeable sequence of change records between two tree
/// snapshots.
///
/// Entries arrive in ascending path order ([`DiffEntry::compare_paths`]);
/// the merge-join is only correct under that ordering. Pulling the next
/// entry may itself perform I/O against the underlying tree store.
pub trait PathOrderedDiffStream {
    /// The next change record, or `None` when the stream is exhausted.
    fn next_entry(&mut self) -> Option<DiffEntry>;

    /// Release any underlying resources. Called exactly once when the
    /// scenario finishes or is cancelled.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Read-side contract: revision graph, tree diffing, and object retrieval.
pub trait Repository {
    /// The diff stream type this repository produces.
    type Stream: PathOrderedDiffStream;

    /// Diff two revisions' trees, yielding changes in canonical path order.
    ///
    /// With `report_trees` set, tree-level (non-leaf) entries are included
    /// ahead of their children; the classifier needs them to detect schema
    /// conflicts.
    ///
    /// # Errors
    /// Fails if either revision is unknown.
    fn diff(
        &self,
        old: &RevisionId,
        new: &RevisionId,
        report_trees: bool,
    ) -> Result<Self::Stream, MergeError>;

    /// The most recent revision both histories descend from, or `None` when
    /// the histories are unrelated.
    ///
    /// # Errors
    /// Fails if either revision is unknown.
    fn find_common_ancestor(
        &self,
        left: &RevisionId,
        right: &RevisionId,
    ) -> Result<Option<RevisionId>, MergeError>;

    /// Fetch a feature by content id.
    ///
    /// # Errors
    /// Fails if the id is dangling.
    fn feature(&self, id: &ObjectId) -> Result<Feature, MergeError>;

    /// Fetch a schema by content id.
    ///
    /// # Errors
    /// Fails if the id is dangling.
    fn schema(&self, id: &ObjectId) -> Result<Schema, MergeError>;
}

// ---------------------------------------------------------------------------
// Write-side sinks
// ---------------------------------------------------------------------------

/// Durable conflict storage, namespaced per merge attempt.
pub trait ConflictStore {
    /// Persist a batch of conflicts under `namespace`.
    ///
    /// # Errors
    /// Fails on storage errors; a failed write aborts the merge.
    fn add_conflicts(&mut self, namespace: &str, conflicts: &[Conflict]) -> Result<(), MergeError>;

    /// All stored conflicts under `namespace`, optionally restricted to
    /// paths beginning with `path_filter`.
    ///
    /// # Errors
    /// Fails on storage errors.
    fn get_conflicts(
        &self,
        namespace: &str,
        path_filter: Option<&str>,
    ) -> Result<Vec<Conflict>, MergeError>;

    /// Drop every conflict stored under `namespace`.
    ///
    /// # Errors
    /// Fails on storage errors.
    fn remove_conflicts(&mut self, namespace: &str) -> Result<(), MergeError>;
}

/// The mutable working copy merged features are written into.
pub trait WorkingCopy {
    /// Insert (or replace) one reconciled feature at its path.
    ///
    /// # Errors
    /// Fails on storage errors; a failed insert aborts the merge.
    fn insert(&mut self, info: &FeatureInfo) -> Result<(), MergeError>;
}

/// The staging area unconflicted changes are queued into.
pub trait StagingArea {
    /// Stage a batch of change records for the eventual merge commit.
    ///
    /// # Errors
    /// Fails on storage errors; a failed stage aborts the merge.
    fn stage(&mut self, changes: Vec<DiffEntry>) -> Result<(), MergeError>;
}
