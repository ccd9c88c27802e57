//! Merge status accumulation.
//!
//! [`MergeStatusBuilder`] is the consumer a real merge runs with: it applies
//! reconciled features to the working copy as they arrive, buffers
//! unconflicted changes and conflicts in spillable buffers, and flushes both
//! on `finished` — unconflicted changes to the staging area, conflicts to
//! the conflict store. It also accumulates the human-facing merge message
//! and the changed / fast-forward flags the merge command reports from.

use tracing::debug;

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::model::conflict::Conflict;
use crate::model::diff::DiffEntry;
use crate::model::feature::FeatureInfo;
use crate::model::types::RevisionId;
use crate::repo::{ConflictStore, StagingArea, WorkingCopy};

use super::buffer::SpillBuffer;
use super::report::MergeScenarioConsumer;

// ---------------------------------------------------------------------------
// MergeStatusBuilder
// ---------------------------------------------------------------------------

/// Scenario consumer that persists results and accumulates merge status.
pub struct MergeStatusBuilder<'a, W, S, C> {
    working: &'a mut W,
    staging: &'a mut S,
    conflict_store: &'a mut C,
    /// Conflict-store namespace for this merge attempt.
    namespace: String,
    max_reported_conflicts: usize,
    unconflicted: SpillBuffer<DiffEntry>,
    conflicts: SpillBuffer<Conflict>,
    /// The first `max_reported_conflicts` conflicting paths, for the message.
    reported_paths: Vec<String>,
    conflict_count: u64,
    changed: bool,
    flushed: bool,
}

impl<'a, W, S, C> MergeStatusBuilder<'a, W, S, C>
where
    W: WorkingCopy,
    S: StagingArea,
    C: ConflictStore,
{
    pub fn new(
        working: &'a mut W,
        staging: &'a mut S,
        conflict_store: &'a mut C,
        namespace: &str,
        config: &MergeConfig,
    ) -> Self {
        Self {
            working,
            staging,
            conflict_store,
            namespace: namespace.to_owned(),
            max_reported_conflicts: config.max_reported_conflicts,
            unconflicted: SpillBuffer::new(config.spill_chunk_size),
            conflicts: SpillBuffer::new(config.spill_chunk_size),
            reported_paths: Vec::new(),
            conflict_count: 0,
            changed: false,
            flushed: false,
        }
    }

    /// Total conflicts seen so far.
    #[must_use]
    pub const fn conflict_count(&self) -> u64 {
        self.conflict_count
    }

    /// Returns `true` once any change, merged record, or conflict arrived.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        self.changed
    }

    /// Returns `true` while the merge could still be a fast-forward: nothing
    /// arrived that requires a merge commit.
    #[must_use]
    pub const fn is_fast_forward(&self) -> bool {
        !self.changed
    }

    /// The merge commit message for merging `to_merge`, listing at most the
    /// configured number of conflicting paths.
    #[must_use]
    pub fn merge_message(&self, to_merge: &RevisionId) -> String {
        let mut message = format!("Merge commit '{to_merge}'. ");
        if self.conflict_count > 0 {
            message.push_str("\n\nConflicts:\n");
            for path in &self.reported_paths {
                message.push('\t');
                message.push_str(path);
                message.push('\n');
            }
            let listed = self.reported_paths.len() as u64;
            if self.conflict_count > listed {
                message.push_str(&format!(
                    "\tand {} additional conflicts.\n",
                    self.conflict_count - listed
                ));
            }
        }
        message
    }

    /// The advisory printed when the merge did not complete automatically;
    /// empty when there were no conflicts.
    #[must_use]
    pub fn conflict_notice(&self) -> String {
        if self.conflict_count == 0 {
            String::new()
        } else {
            "Automatic merge failed. Fix conflicts and then commit the result.\n".to_owned()
        }
    }
}

impl<W, S, C> MergeScenarioConsumer for MergeStatusBuilder<'_, W, S, C>
where
    W: WorkingCopy,
    S: StagingArea,
    C: ConflictStore,
{
    fn conflicted(&mut self, conflict: Conflict) -> Result<(), MergeError> {
        if self.reported_paths.len() < self.max_reported_conflicts {
            self.reported_paths.push(conflict.path.clone());
        }
        self.conflict_count += 1;
        self.changed = true;
        self.conflicts.push(conflict)
    }

    fn unconflicted(&mut self, change: DiffEntry) -> Result<(), MergeError> {
        self.changed = true;
        self.unconflicted.push(change)
    }

    fn merged(&mut self, feature: FeatureInfo) -> Result<(), MergeError> {
        // Reconciled records go straight into the working copy; there is no
        // staged change record for them.
        self.changed = true;
        self.working.insert(&feature)
    }

    fn finished(&mut self) -> Result<(), MergeError> {
        if self.flushed {
            return Ok(());
        }
        self.flushed = true;

        let unconflicted = std::mem::replace(&mut self.unconflicted, SpillBuffer::new(1));
        let staged = unconflicted.len();
        let changes = unconflicted.drain()?.collect::<Result<Vec<_>, _>>()?;
        if !changes.is_empty() {
            self.staging.stage(changes)?;
        }

        let conflicts = std::mem::replace(&mut self.conflicts, SpillBuffer::new(1));
        let mut stored = 0_usize;
        let mut batch = Vec::new();
        for conflict in conflicts.drain()? {
            batch.push(conflict?);
            if batch.len() >= 1000 {
                self.conflict_store.add_conflicts(&self.namespace, &batch)?;
                stored += batch.len();
                batch.clear();
            }
        }
        if !batch.is_empty() {
            stored += batch.len();
            self.conflict_store.add_conflicts(&self.namespace, &batch)?;
        }

        debug!(staged, conflicts = stored, "merge status flushed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::diff::NodeRef;
    use crate::model::feature::Feature;
    use crate::model::types::ObjectId;
    use crate::model::value::Value;
    use crate::repo::memory::{MemoryConflictStore, MemoryStagingArea, MemoryWorkingCopy};

    fn oid(c: char) -> ObjectId {
        ObjectId::new(&c.to_string().repeat(64)).unwrap()
    }

    fn conflict(path: &str) -> Conflict {
        Conflict::content(path, oid('a'), oid('b'), oid('c'))
    }

    fn change(path: &str) -> DiffEntry {
        DiffEntry::added(NodeRef::feature(path, oid('1'), oid('e')))
    }

    fn small_config() -> MergeConfig {
        MergeConfig {
            spill_chunk_size: 2,
            max_reported_conflicts: 3,
        }
    }

    #[test]
    fn merged_features_land_in_working_copy_immediately() {
        let mut working = MemoryWorkingCopy::new();
        let mut staging = MemoryStagingArea::new();
        let mut store = MemoryConflictStore::new();
        let config = small_config();
        let mut builder =
            MergeStatusBuilder::new(&mut working, &mut staging, &mut store, "MERGE", &config);

        let info = FeatureInfo::new("roads/r1", Feature::new(vec![Value::from("x")]), oid('e'));
        builder.merged(info.clone()).unwrap();
        assert!(builder.is_changed());
        assert!(!builder.is_fast_forward());
        drop(builder);
        assert_eq!(working.inserted, vec![info]);
    }

    #[test]
    fn flush_stages_unconflicted_and_stores_conflicts() {
        let mut working = MemoryWorkingCopy::new();
        let mut staging = MemoryStagingArea::new();
        let mut store = MemoryConflictStore::new();
        let config = small_config();
        let mut builder =
            MergeStatusBuilder::new(&mut working, &mut staging, &mut store, "MERGE", &config);

        // Enough of each to force a spill past the chunk size of 2.
        for i in 0..5 {
            builder.unconflicted(change(&format!("roads/u{i}"))).unwrap();
            builder.conflicted(conflict(&format!("roads/c{i}"))).unwrap();
        }
        builder.finished().unwrap();
        drop(builder);

        assert_eq!(staging.staged.len(), 5);
        assert_eq!(staging.staged[0].path(), "roads/u0");
        let stored = store.get_conflicts("MERGE", None).unwrap();
        assert_eq!(stored.len(), 5);
        assert_eq!(stored[0].path, "roads/c0");
    }

    #[test]
    fn finished_twice_flushes_once() {
        let mut working = MemoryWorkingCopy::new();
        let mut staging = MemoryStagingArea::new();
        let mut store = MemoryConflictStore::new();
        let config = small_config();
        let mut builder =
            MergeStatusBuilder::new(&mut working, &mut staging, &mut store, "MERGE", &config);
        builder.unconflicted(change("roads/u0")).unwrap();
        builder.finished().unwrap();
        builder.finished().unwrap();
        drop(builder);
        assert_eq!(staging.staged.len(), 1);
    }

    #[test]
    fn message_lists_capped_conflict_paths() {
        let mut working = MemoryWorkingCopy::new();
        let mut staging = MemoryStagingArea::new();
        let mut store = MemoryConflictStore::new();
        let config = small_config();
        let mut builder =
            MergeStatusBuilder::new(&mut working, &mut staging, &mut store, "MERGE", &config);

        for i in 0..5 {
            builder.conflicted(conflict(&format!("roads/c{i}"))).unwrap();
        }
        let rev = RevisionId::new(&"f".repeat(64)).unwrap();
        let message = builder.merge_message(&rev);
        assert!(message.starts_with(&format!("Merge commit '{rev}'. ")));
        assert!(message.contains("\n\nConflicts:\n"));
        assert!(message.contains("\troads/c0\n"));
        assert!(message.contains("\troads/c2\n"));
        // Only 3 of 5 paths are listed.
        assert!(!message.contains("roads/c3"));
        assert!(message.contains("\tand 2 additional conflicts.\n"));
        assert_eq!(
            builder.conflict_notice(),
            "Automatic merge failed. Fix conflicts and then commit the result.\n"
        );
    }

    #[test]
    fn clean_merge_message_has_no_conflict_section() {
        let mut working = MemoryWorkingCopy::new();
        let mut staging = MemoryStagingArea::new();
        let mut store = MemoryConflictStore::new();
        let config = MergeConfig::default();
        let mut builder =
            MergeStatusBuilder::new(&mut working, &mut staging, &mut store, "MERGE", &config);
        builder.unconflicted(change("roads/u0")).unwrap();

        let rev = RevisionId::new(&"f".repeat(64)).unwrap();
        assert_eq!(builder.merge_message(&rev), format!("Merge commit '{rev}'. "));
        assert_eq!(builder.conflict_notice(), "");
        assert_eq!(builder.conflict_count(), 0);
    }
}
