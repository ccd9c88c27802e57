//! Merge-join over two path-ordered diff streams.
//!
//! Both branch diffs are computed against the same ancestor and arrive in
//! ascending path order, so pairing up the changes to each path is a single
//! synchronized walk: peek at the head of each stream, emit the
//! lexicographically smaller path as a one-sided pair, and emit matching
//! paths as a two-sided pair. Each input entry appears in exactly one output
//! pair, and output pairs come out in ascending path order.

use std::cmp::Ordering;

use crate::model::diff::DiffEntry;
use crate::repo::PathOrderedDiffStream;

// ---------------------------------------------------------------------------
// DiffPair
// ---------------------------------------------------------------------------

/// The changes both branches made to one path, either side possibly absent.
///
/// Built only through the constructors, which guarantee at least one side is
/// present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffPair {
    /// The change on the branch being merged into.
    pub ours: Option<DiffEntry>,
    /// The change on the branch being merged.
    pub theirs: Option<DiffEntry>,
}

impl DiffPair {
    #[must_use]
    pub const fn ours_only(ours: DiffEntry) -> Self {
        Self {
            ours: Some(ours),
            theirs: None,
        }
    }

    #[must_use]
    pub const fn theirs_only(theirs: DiffEntry) -> Self {
        Self {
            ours: None,
            theirs: Some(theirs),
        }
    }

    #[must_use]
    pub const fn both(ours: DiffEntry, theirs: DiffEntry) -> Self {
        Self {
            ours: Some(ours),
            theirs: Some(theirs),
        }
    }

    /// The path both sides describe.
    #[must_use]
    pub fn path(&self) -> &str {
        self.ours
            .as_ref()
            .or(self.theirs.as_ref())
            .map_or("", |e| e.path())
    }

    /// Returns `true` when both branches touched the path.
    #[must_use]
    pub const fn is_both(&self) -> bool {
        self.ours.is_some() && self.theirs.is_some()
    }
}

// ---------------------------------------------------------------------------
// MergeJoin
// ---------------------------------------------------------------------------

/// Iterator pairing two path-ordered diff streams by path.
#[derive(Debug)]
pub struct MergeJoin<L, R> {
    ours: L,
    theirs: R,
    peeked_ours: Option<DiffEntry>,
    peeked_theirs: Option<DiffEntry>,
}

impl<L, R> MergeJoin<L, R>
where
    L: PathOrderedDiffStream,
    R: PathOrderedDiffStream,
{
    #[must_use]
    pub fn new(ours: L, theirs: R) -> Self {
        Self {
            ours,
            theirs,
            peeked_ours: None,
            peeked_theirs: None,
        }
    }

    /// Close both underlying streams.
    pub fn close(&mut self) {
        self.ours.close();
        self.theirs.close();
    }
}

impl<L, R> Iterator for MergeJoin<L, R>
where
    L: PathOrderedDiffStream,
    R: PathOrderedDiffStream,
{
    type Item = DiffPair;

    fn next(&mut self) -> Option<DiffPair> {
        if self.peeked_ours.is_none() {
            self.peeked_ours = self.ours.next_entry();
        }
        if self.peeked_theirs.is_none() {
            self.peeked_theirs = self.theirs.next_entry();
        }
        match (&self.peeked_ours, &self.peeked_theirs) {
            (None, None) => None,
            (Some(_), None) => self.peeked_ours.take().map(DiffPair::ours_only),
            (None, Some(_)) => self.peeked_theirs.take().map(DiffPair::theirs_only),
            (Some(o), Some(t)) => match o.compare_paths(t) {
                Ordering::Less => self.peeked_ours.take().map(DiffPair::ours_only),
                Ordering::Greater => self.peeked_theirs.take().map(DiffPair::theirs_only),
                Ordering::Equal => match (self.peeked_ours.take(), self.peeked_theirs.take()) {
                    (Some(o), Some(t)) => Some(DiffPair::both(o, t)),
                    _ => None,
                },
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
