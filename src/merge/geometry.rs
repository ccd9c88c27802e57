//! Geometry edit scripts.
//!
//! When both branches edit the same geometry, a plain value comparison would
//! call it a conflict even though the edits touch different vertices. Instead
//! the engine computes a longest-common-subsequence edit script between the
//! ancestor and "theirs" coordinate sequences and replays it on top of
//! "ours". Geometries are flattened to a token stream — one token per
//! coordinate, with a separator token between parts — so ring and
//! sub-geometry boundaries survive the diff.
//!
//! Application is strict where it matters: a delete whose context coordinates
//! no longer match fails the patch, and the caller keeps "ours" unchanged.

use crate::model::value::{Coord, Geometry, GeometryKind};

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// One element of a flattened geometry: a coordinate, or the boundary
/// between two parts.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Break,
    Coord(Coord),
}

fn tokenize(geometry: &Geometry) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(geometry.coord_count() + geometry.parts.len());
    for (i, part) in geometry.parts.iter().enumerate() {
        if i > 0 {
            tokens.push(Token::Break);
        }
        tokens.extend(part.iter().copied().map(Token::Coord));
    }
    tokens
}

fn assemble(kind: GeometryKind, tokens: &[Token]) -> Option<Geometry> {
    let mut parts: Vec<Vec<Coord>> = vec![Vec::new()];
    for token in tokens {
        match token {
            Token::Break => parts.push(Vec::new()),
            Token::Coord(c) => {
                if let Some(part) = parts.last_mut() {
                    part.push(*c);
                }
            }
        }
    }
    // A patch that leaves an empty ring or sub-geometry behind did not apply
    // cleanly.
    if parts.iter().any(Vec::is_empty) {
        return None;
    }
    Some(Geometry { kind, parts })
}

// ---------------------------------------------------------------------------
// GeometryDiff
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
enum EditOp {
    /// Copy the next `n` tokens from the target unchanged.
    Retain(usize),
    /// Remove these exact tokens; mismatch fails the patch.
    Delete(Vec<Token>),
    /// Insert these tokens.
    Insert(Vec<Token>),
}

/// An edit script turning one geometry's coordinate sequence into another's.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryDiff {
    old_kind: GeometryKind,
    new_kind: GeometryKind,
    ops: Vec<EditOp>,
}

impl GeometryDiff {
    /// Compute the edit script from `old` to `new`.
    #[must_use]
    pub fn between(old: &Geometry, new: &Geometry) -> Self {
        let a = tokenize(old);
        let b = tokenize(new);
        Self {
            old_kind: old.kind,
            new_kind: new.kind,
            ops: edit_script(&a, &b),
        }
    }

    /// Number of coordinates the script inserts.
    #[must_use]
    pub fn inserted_count(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                EditOp::Insert(tokens) => count_coords(tokens),
                _ => 0,
            })
            .sum()
    }

    /// Number of coordinates the script deletes.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                EditOp::Delete(tokens) => count_coords(tokens),
                _ => 0,
            })
            .sum()
    }

    /// Returns `true` if the script changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.old_kind == self.new_kind
            && self.ops.iter().all(|op| matches!(op, EditOp::Retain(_)))
    }

    /// Replay this script on top of `target`, which may differ from the
    /// geometry the script was computed from.
    ///
    /// Retained regions are copied from `target` as-is, so edits the target
    /// made to coordinates the script does not touch are preserved. Returns
    /// `None` when the script does not apply cleanly: a deleted coordinate
    /// was also edited in the target, the target is shorter than the script
    /// expects, or the shape kinds cannot be reconciled.
    #[must_use]
    pub fn apply_to(&self, target: &Geometry) -> Option<Geometry> {
        let kind = if target.kind == self.old_kind {
            self.new_kind
        } else if self.old_kind == self.new_kind {
            target.kind
        } else {
            return None;
        };

        let tokens = tokenize(target);
        let mut out = Vec::with_capacity(tokens.len());
        let mut cursor: usize = 0;
        for op in &self.ops {
            match op {
                EditOp::Retain(n) => {
                    let end = cursor.checked_add(*n)?;
                    out.extend_from_slice(tokens.get(cursor..end)?);
                    cursor = end;
                }
                EditOp::Delete(expected) => {
                    let end = cursor.checked_add(expected.len())?;
                    if tokens.get(cursor..end)? != expected.as_slice() {
                        return None;
                    }
                    cursor = end;
                }
                EditOp::Insert(inserted) => out.extend_from_slice(inserted),
            }
        }
        // Tokens the target holds beyond the script's reach are edits of its
        // own; keep them.
        out.extend_from_slice(&tokens[cursor.min(tokens.len())..]);

        assemble(kind, &out)
    }
}

fn count_coords(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .filter(|t| matches!(t, Token::Coord(_)))
        .count()
}

// ---------------------------------------------------------------------------
// LCS
// ---------------------------------------------------------------------------

/// Classic dynamic-programming LCS backtrack, coalesced into runs.
fn edit_script(a: &[Token], b: &[Token]) -> Vec<EditOp> {
    let n = a.len();
    let m = b.len();
    // lcs[i][j] = LCS length of a[i..] and b[j..].
    let mut lcs = vec![vec![0_usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops: Vec<EditOp> = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && a[i] == b[j] {
            match ops.last_mut() {
                Some(EditOp::Retain(count)) => *count += 1,
                _ => ops.push(EditOp::Retain(1)),
            }
            i += 1;
            j += 1;
        } else if j < m && (i == n || lcs[i][j + 1] >= lcs[i + 1][j]) {
            match ops.last_mut() {
                Some(EditOp::Insert(tokens)) => tokens.push(b[j]),
                _ => ops.push(EditOp::Insert(vec![b[j]])),
            }
            j += 1;
        } else {
            match ops.last_mut() {
                Some(EditOp::Delete(tokens)) => tokens.push(a[i]),
                _ => ops.push(EditOp::Delete(vec![a[i]])),
            }
            i += 1;
        }
    }
    ops
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
