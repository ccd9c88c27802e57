//! In-memory reference implementation of the repository contracts.
//!
//! Backs the unit and integration tests: snapshots are sorted maps of path →
//! node, the revision graph is an explicit parent map, and diffing two
//! snapshots walks the union of their sorted keys — which yields exactly the
//! canonical path order the engine requires. Nothing here is durable.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use super::{ConflictStore, PathOrderedDiffStream, Repository, StagingArea, WorkingCopy};
use crate::error::MergeError;
use crate::model::conflict::Conflict;
use crate::model::diff::{DiffEntry, NodeKind, NodeRef};
use crate::model::feature::{Feature, FeatureInfo, Schema};
use crate::model::types::{ObjectId, RevisionId};

/// A snapshot: every node (tree and leaf) keyed by full path, sorted.
pub type Snapshot = BTreeMap<String, NodeRef>;

// ---------------------------------------------------------------------------
// MemoryRepo
// ---------------------------------------------------------------------------

/// An in-memory object store plus revision graph.
#[derive(Debug, Default)]
pub struct MemoryRepo {
    features: HashMap<ObjectId, Feature>,
    schemas: HashMap<ObjectId, Schema>,
    snapshots: HashMap<RevisionId, Snapshot>,
    parents: HashMap<RevisionId, Vec<RevisionId>>,
}

impl MemoryRepo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a new snapshot. Chain [`SnapshotBuilder::parent`] to
    /// base it on an existing revision.
    pub fn build_snapshot(&mut self) -> SnapshotBuilder<'_> {
        SnapshotBuilder {
            repo: self,
            leaves: BTreeMap::new(),
            layer_schemas: BTreeMap::new(),
            parents: Vec::new(),
        }
    }

    /// The stored snapshot for a revision.
    ///
    /// # Errors
    /// Fails if the revision is unknown.
    pub fn snapshot(&self, rev: &RevisionId) -> Result<&Snapshot, MergeError> {
        self.snapshots
            .get(rev)
            .ok_or_else(|| MergeError::RevisionNotFound {
                revision: rev.clone(),
            })
    }

    fn ancestors_of(&self, rev: &RevisionId) -> HashSet<RevisionId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([rev.clone()]);
        while let Some(r) = queue.pop_front() {
            if seen.insert(r.clone()) {
                if let Some(parents) = self.parents.get(&r) {
                    queue.extend(parents.iter().cloned());
                }
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// SnapshotBuilder
// ---------------------------------------------------------------------------

/// Builds one committed snapshot: leaf features grouped into layers, with
/// per-layer schemas, then derives tree nodes and a content-derived revision
/// id on [`SnapshotBuilder::commit`].
pub struct SnapshotBuilder<'a> {
    repo: &'a mut MemoryRepo,
    leaves: BTreeMap<String, NodeRef>,
    layer_schemas: BTreeMap<String, ObjectId>,
    parents: Vec<RevisionId>,
}

impl SnapshotBuilder<'_> {
    /// Base this snapshot on an existing revision, inheriting its leaves and
    /// layer schemas. Call before any mutation.
    ///
    /// # Panics
    /// Panics if the revision is unknown (builder misuse in tests).
    #[must_use]
    pub fn parent(mut self, rev: &RevisionId) -> Self {
        let snapshot = self
            .repo
            .snapshots
            .get(rev)
            .unwrap_or_else(|| panic!("unknown parent revision {rev}"))
            .clone();
        for (path, node) in snapshot {
            match node.kind {
                NodeKind::Feature => {
                    self.leaves.insert(path, node);
                }
                NodeKind::Tree => {
                    self.layer_schemas.insert(path, node.metadata_id);
                }
            }
        }
        self.parents.push(rev.clone());
        self
    }

    /// Declare (or re-declare) a layer's schema without touching features.
    #[must_use]
    pub fn layer(mut self, layer: &str, schema: &Schema) -> Self {
        let schema_id = schema.id();
        self.repo.schemas.insert(schema_id.clone(), schema.clone());
        self.layer_schemas.insert(layer.to_owned(), schema_id);
        self
    }

    /// Put a feature at `<layer>/<name>`. The layer's schema defaults to the
    /// feature's schema unless previously declared via [`Self::layer`].
    #[must_use]
    pub fn feature(mut self, layer: &str, name: &str, schema: &Schema, feature: Feature) -> Self {
        let schema_id = schema.id();
        let feature_id = feature.id();
        self.repo.schemas.insert(schema_id.clone(), schema.clone());
        self.repo.features.insert(feature_id.clone(), feature);
        self.layer_schemas
            .entry(layer.to_owned())
            .or_insert_with(|| schema_id.clone());

        let path = format!("{layer}/{name}");
        self.leaves
            .insert(path.clone(), NodeRef::feature(&path, feature_id, schema_id));
        self
    }

    /// Remove the node at `path`, if present.
    #[must_use]
    pub fn remove(mut self, path: &str) -> Self {
        self.leaves.remove(path);
        self
    }

    /// Derive tree nodes, store the snapshot, and return its revision id.
    #[must_use]
    pub fn commit(self) -> RevisionId {
        let mut nodes: Snapshot = self.leaves.clone();

        // One tree node per layer that has leaves or a declared schema. The
        // tree's object id is derived from its children so that any leaf
        // change changes the layer id too.
        let mut layers: BTreeMap<String, Vec<&NodeRef>> = BTreeMap::new();
        for node in self.leaves.values() {
            if let Some((layer, _)) = node.path.rsplit_once('/') {
                layers.entry(layer.to_owned()).or_default().push(node);
            }
        }
        for layer in self.layer_schemas.keys() {
            layers.entry(layer.clone()).or_default();
        }
        for (layer, children) in &layers {
            let mut acc = layer.clone().into_bytes();
            for child in children {
                acc.extend_from_slice(child.path.as_bytes());
                acc.extend_from_slice(child.object_id.as_str().as_bytes());
                acc.extend_from_slice(child.metadata_id.as_str().as_bytes());
            }
            let metadata_id = self
                .layer_schemas
                .get(layer)
                .cloned()
                .unwrap_or_else(ObjectId::null);
            acc.extend_from_slice(metadata_id.as_str().as_bytes());
            let tree_id = ObjectId::hash_of(&acc);
            nodes.insert(layer.clone(), NodeRef::tree(layer, tree_id, metadata_id));
        }

        // Revision id from the snapshot contents plus parentage.
        let mut acc = Vec::new();
        for (path, node) in &nodes {
            acc.extend_from_slice(path.as_bytes());
            acc.extend_from_slice(node.object_id.as_str().as_bytes());
            acc.extend_from_slice(node.metadata_id.as_str().as_bytes());
        }
        for parent in &self.parents {
            acc.extend_from_slice(parent.as_str().as_bytes());
        }
        let rev = RevisionId::try_from(String::from(ObjectId::hash_of(&acc)))
            .unwrap_or_else(|_| unreachable!("hash output is a valid id"));

        self.repo.snapshots.insert(rev.clone(), nodes);
        self.repo.parents.insert(rev.clone(), self.parents);
        rev
    }
}

// ---------------------------------------------------------------------------
// MemoryDiffStream
// ---------------------------------------------------------------------------

/// A fully materialized, path-ordered diff stream.
#[derive(Debug)]
pub struct MemoryDiffStream {
    entries: std::vec::IntoIter<DiffEntry>,
    closed: bool,
}

impl PathOrderedDiffStream for MemoryDiffStream {
    fn next_entry(&mut self) -> Option<DiffEntry> {
        if self.closed {
            return None;
        }
        self.entries.next()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

// ---------------------------------------------------------------------------
// Repository impl
// ---------------------------------------------------------------------------

impl Repository for MemoryRepo {
    type Stream = MemoryDiffStream;

    fn diff(
        &self,
        old: &RevisionId,
        new: &RevisionId,
        report_trees: bool,
    ) -> Result<Self::Stream, MergeError> {
        let old_nodes = self.snapshot(old)?;
        let new_nodes = self.snapshot(new)?;

        let mut entries = Vec::new();
        let mut paths: Vec<&String> = old_nodes.keys().chain(new_nodes.keys()).collect();
        paths.sort();
        paths.dedup();

        for path in paths {
            let old_node = old_nodes.get(path);
            let new_node = new_nodes.get(path);
            let entry = match (old_node, new_node) {
                (None, Some(n)) => DiffEntry::added(n.clone()),
                (Some(o), None) => DiffEntry::removed(o.clone()),
                (Some(o), Some(n)) if o != n => DiffEntry::modified(o.clone(), n.clone()),
                _ => continue,
            };
            if !report_trees && matches!(entry.new_kind().or(entry.old.as_ref().map(|r| r.kind)), Some(NodeKind::Tree)) {
                continue;
            }
            entries.push(entry);
        }

        Ok(MemoryDiffStream {
            entries: entries.into_iter(),
            closed: false,
        })
    }

    fn find_common_ancestor(
        &self,
        left: &RevisionId,
        right: &RevisionId,
    ) -> Result<Option<RevisionId>, MergeError> {
        if !self.snapshots.contains_key(left) {
            return Err(MergeError::RevisionNotFound {
                revision: left.clone(),
            });
        }
        if !self.snapshots.contains_key(right) {
            return Err(MergeError::RevisionNotFound {
                revision: right.clone(),
            });
        }
        let left_ancestors = self.ancestors_of(left);
        // Breadth-first from `right`: the first hit is the nearest shared
        // revision on the right-hand history.
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([right.clone()]);
        while let Some(r) = queue.pop_front() {
            if left_ancestors.contains(&r) {
                return Ok(Some(r));
            }
            if seen.insert(r.clone()) {
                if let Some(parents) = self.parents.get(&r) {
                    queue.extend(parents.iter().cloned());
                }
            }
        }
        Ok(None)
    }

    fn feature(&self, id: &ObjectId) -> Result<Feature, MergeError> {
        self.features
            .get(id)
            .cloned()
            .ok_or_else(|| MergeError::ObjectNotFound { id: id.clone() })
    }

    fn schema(&self, id: &ObjectId) -> Result<Schema, MergeError> {
        self.schemas
            .get(id)
            .cloned()
            .ok_or_else(|| MergeError::ObjectNotFound { id: id.clone() })
    }
}

// ---------------------------------------------------------------------------
// Write-side sinks
// ---------------------------------------------------------------------------

/// Conflict storage keyed by namespace; inspectable by tests.
#[derive(Debug, Default)]
pub struct MemoryConflictStore {
    conflicts: HashMap<String, Vec<Conflict>>,
}

impl MemoryConflictStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConflictStore for MemoryConflictStore {
    fn add_conflicts(&mut self, namespace: &str, conflicts: &[Conflict]) -> Result<(), MergeError> {
        self.conflicts
            .entry(namespace.to_owned())
            .or_default()
            .extend_from_slice(conflicts);
        Ok(())
    }

    fn get_conflicts(
        &self,
        namespace: &str,
        path_filter: Option<&str>,
    ) -> Result<Vec<Conflict>, MergeError> {
        let all = self.conflicts.get(namespace).cloned().unwrap_or_default();
        Ok(match path_filter {
            None => all,
            Some(prefix) => all
                .into_iter()
                .filter(|c| c.path.starts_with(prefix))
                .collect(),
        })
    }

    fn remove_conflicts(&mut self, namespace: &str) -> Result<(), MergeError> {
        self.conflicts.remove(namespace);
        Ok(())
    }
}

/// Working copy that records inserted features in arrival order.
#[derive(Debug, Default)]
pub struct MemoryWorkingCopy {
    pub inserted: Vec<FeatureInfo>,
}

impl MemoryWorkingCopy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkingCopy for MemoryWorkingCopy {
    fn insert(&mut self, info: &FeatureInfo) -> Result<(), MergeError> {
        self.inserted.push(info.clone());
        Ok(())
    }
}

/// Staging area that records staged change batches.
#[derive(Debug, Default)]
pub struct MemoryStagingArea {
    pub staged: Vec<DiffEntry>,
}

impl MemoryStagingArea {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StagingArea for MemoryStagingArea {
    fn stage(&mut self, changes: Vec<DiffEntry>) -> Result<(), MergeError> {
        self.staged.extend(changes);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
