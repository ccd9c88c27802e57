//! The merge scenario engine.
//!
//! Computing a merge scenario means answering, for every path either branch
//! touched since their common ancestor: does the change apply cleanly, does
//! it need a reconciled record, or is it a conflict? The driver here wires
//! the pipeline together — two ancestor-rooted diff streams, the merge-join
//! pairing them by path, the classifier, and a caller-supplied consumer —
//! and streams results through without materializing the scenario.

pub mod buffer;
pub mod classify;
pub mod geometry;
pub mod join;
pub mod reconcile;
pub mod report;
pub mod status;

use tracing::debug;

use crate::error::MergeError;
use crate::model::types::RevisionId;
use crate::repo::Repository;

use classify::{MergeEvent, classify};
use join::MergeJoin;
use report::{MergeScenarioConsumer, MergeScenarioReport};

// ---------------------------------------------------------------------------
// MergeScenario
// ---------------------------------------------------------------------------

/// One scenario computation: merging `to_merge` into `merge_into`.
#[derive(Clone, Debug)]
pub struct MergeScenario<'a, R> {
    repo: &'a R,
    merge_into: RevisionId,
    to_merge: RevisionId,
}

impl<'a, R: Repository> MergeScenario<'a, R> {
    #[must_use]
    pub const fn new(repo: &'a R, merge_into: RevisionId, to_merge: RevisionId) -> Self {
        Self {
            repo,
            merge_into,
            to_merge,
        }
    }

    /// Run the scenario, streaming every result to `consumer`.
    ///
    /// Results arrive in ascending path order. The consumer's `finished` is
    /// invoked exactly once, whether the scenario completes, is cancelled
    /// between pairs, or fails.
    ///
    /// # Errors
    /// Fails when the two revisions share no ancestor, when an object a diff
    /// stream references cannot be loaded, or when the consumer reports an
    /// error.
    pub fn report_to<C: MergeScenarioConsumer>(
        &self,
        consumer: &mut C,
    ) -> Result<MergeScenarioReport, MergeError> {
        let ancestor = self
            .repo
            .find_common_ancestor(&self.merge_into, &self.to_merge)?
            .ok_or_else(|| MergeError::NoCommonAncestor {
                to_merge: self.to_merge.clone(),
                merge_into: self.merge_into.clone(),
            })?;
        debug!(%ancestor, merge_into = %self.merge_into, to_merge = %self.to_merge,
            "computing merge scenario");

        // Tree-level entries are requested so layer schema changes reach the
        // classifier.
        let ours = self.repo.diff(&ancestor, &self.merge_into, true)?;
        let theirs = self.repo.diff(&ancestor, &self.to_merge, true)?;
        let mut join = MergeJoin::new(ours, theirs);

        let mut report = MergeScenarioReport::default();
        let result = Self::drive(self.repo, &mut join, consumer, &mut report);
        join.close();
        let finish = consumer.finished();
        result?;
        finish?;

        debug!(
            conflicts = report.conflicts,
            unconflicted = report.unconflicted,
            merged = report.merged,
            "merge scenario complete"
        );
        Ok(report)
    }

    fn drive<C: MergeScenarioConsumer>(
        repo: &R,
        join: &mut MergeJoin<R::Stream, R::Stream>,
        consumer: &mut C,
        report: &mut MergeScenarioReport,
    ) -> Result<(), MergeError> {
        for pair in join {
            if consumer.is_cancelled() {
                debug!("merge scenario cancelled");
                return Ok(());
            }
            match classify(repo, pair)? {
                None => {}
                Some(MergeEvent::Conflicted(conflict)) => {
                    report.conflicts += 1;
                    consumer.conflicted(conflict)?;
                }
                Some(MergeEvent::Unconflicted(change)) => {
                    report.unconflicted += 1;
                    consumer.unconflicted(change)?;
                }
                Some(MergeEvent::Merged(feature)) => {
                    report.merged += 1;
                    consumer.merged(feature)?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
