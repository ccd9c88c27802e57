//! Scenario consumers and the summary report.
//!
//! The engine streams each classified result to a [`MergeScenarioConsumer`]
//! the moment it is produced, so callers can persist or display results
//! without the whole scenario being materialized first. The returned
//! [`MergeScenarioReport`] only counts outcomes.

use crate::error::MergeError;
use crate::model::conflict::Conflict;
use crate::model::diff::DiffEntry;
use crate::model::feature::FeatureInfo;

// ---------------------------------------------------------------------------
// MergeScenarioConsumer
// ---------------------------------------------------------------------------

/// Receives merge-scenario results as they are classified.
///
/// `finished` is invoked exactly once, after the last event — also when the
/// scenario was cancelled or failed partway, so consumers can release
/// resources unconditionally.
pub trait MergeScenarioConsumer {
    /// A path neither side's changes could settle automatically.
    ///
    /// # Errors
    /// A consumer error aborts the scenario.
    fn conflicted(&mut self, conflict: Conflict) -> Result<(), MergeError>;

    /// A change only the other branch made; it applies as-is.
    ///
    /// # Errors
    /// A consumer error aborts the scenario.
    fn unconflicted(&mut self, change: DiffEntry) -> Result<(), MergeError>;

    /// A feature both branches edited that reconciled into a new record.
    ///
    /// # Errors
    /// A consumer error aborts the scenario.
    fn merged(&mut self, feature: FeatureInfo) -> Result<(), MergeError>;

    /// The scenario is complete; no further events follow.
    ///
    /// # Errors
    /// A consumer error surfaces to the caller after the scenario result.
    fn finished(&mut self) -> Result<(), MergeError>;

    /// Polled between events; returning `true` stops the scenario early.
    fn is_cancelled(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// MergeScenarioReport
// ---------------------------------------------------------------------------

/// Outcome counts for one scenario run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeScenarioReport {
    /// Paths reported as conflicted.
    pub conflicts: u64,
    /// Changes that apply cleanly from the merged branch.
    pub unconflicted: u64,
    /// Features reconciled attribute-by-attribute into new records.
    pub merged: u64,
}

impl MergeScenarioReport {
    /// Total number of reported results.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.conflicts + self.unconflicted + self.merged
    }

    /// Returns `true` if no conflicts were reported.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.conflicts == 0
    }
}

// ---------------------------------------------------------------------------
// CollectingConsumer
// ---------------------------------------------------------------------------

/// A consumer that keeps every event in memory. Used by tests and by callers
/// that want the full scenario materialized.
#[derive(Debug, Default)]
pub struct CollectingConsumer {
    pub conflicts: Vec<Conflict>,
    pub unconflicted: Vec<DiffEntry>,
    pub merged: Vec<FeatureInfo>,
    pub finished: bool,
    /// When set, reports cancellation once this many events were received.
    pub cancel_after: Option<usize>,
}

impl CollectingConsumer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn events_seen(&self) -> usize {
        self.conflicts.len() + self.unconflicted.len() + self.merged.len()
    }
}

impl MergeScenarioConsumer for CollectingConsumer {
    fn conflicted(&mut self, conflict: Conflict) -> Result<(), MergeError> {
        self.conflicts.push(conflict);
        Ok(())
    }

    fn unconflicted(&mut self, change: DiffEntry) -> Result<(), MergeError> {
        self.unconflicted.push(change);
        Ok(())
    }

    fn merged(&mut self, feature: FeatureInfo) -> Result<(), MergeError> {
        self.merged.push(feature);
        Ok(())
    }

    fn finished(&mut self) -> Result<(), MergeError> {
        self.finished = true;
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_after
            .is_some_and(|limit| self.events_seen() >= limit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
