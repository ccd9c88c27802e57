//! Conflict classification.
//!
//! Given the paired changes both branches made to one path, decide the
//! outcome: nothing to do, an unconflicted change to apply, a reconciled
//! feature, or a conflict. Changes made only on the branch being merged into
//! are already present there and produce no event at all.
//!
//! Tree (layer) entries classify by schema id: two branches pointing the
//! same layer at different schemas is a schema conflict, which poisons every
//! feature-level reconciliation under it — the feature cases below therefore
//! re-check schema ids and refuse to reconcile across differing schemas.

use crate::error::MergeError;
use crate::model::conflict::Conflict;
use crate::model::diff::{ChangeType, DiffEntry, NodeKind};
use crate::model::feature::FeatureInfo;
use crate::model::types::ObjectId;
use crate::repo::Repository;

use super::join::DiffPair;
use super::reconcile::{FeatureDiff, merge_features};

// ---------------------------------------------------------------------------
// MergeEvent
// ---------------------------------------------------------------------------

/// One classified outcome, ready for a consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum MergeEvent {
    /// The path cannot be settled automatically.
    Conflicted(Conflict),
    /// The other branch's change applies as-is.
    Unconflicted(DiffEntry),
    /// Both branches' edits composed into a new record.
    Merged(FeatureInfo),
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

/// Classify one joined pair of changes.
///
/// # Errors
/// Fails when an object referenced by the diff streams cannot be loaded.
pub fn classify<R: Repository>(repo: &R, pair: DiffPair) -> Result<Option<MergeEvent>, MergeError> {
    match (pair.ours, pair.theirs) {
        // Only our branch touched the path; it is already in place.
        (Some(_), None) | (None, None) => Ok(None),
        // Only the merged branch touched it; apply verbatim.
        (None, Some(theirs)) => Ok(Some(MergeEvent::Unconflicted(theirs))),
        (Some(ours), Some(theirs)) => classify_both(repo, &ours, &theirs),
    }
}

fn classify_both<R: Repository>(
    repo: &R,
    ours: &DiffEntry,
    theirs: &DiffEntry,
) -> Result<Option<MergeEvent>, MergeError> {
    let path = ours.path();

    if ours.change_type() != theirs.change_type() {
        // Remove-vs-modify and the like: no automatic resolution.
        return Ok(Some(MergeEvent::Conflicted(Conflict::content(
            path,
            ours.old_object_id(),
            ours.new_object_id(),
            theirs.new_object_id(),
        ))));
    }

    let is_tree = ours.new_kind() == Some(NodeKind::Tree)
        || theirs.new_kind() == Some(NodeKind::Tree);

    match ours.change_type() {
        // Both branches deleted it; the deletion is already in place.
        ChangeType::Removed => Ok(None),
        ChangeType::Added if is_tree => Ok(classify_tree(
            path,
            ObjectId::null(),
            new_metadata_id(ours),
            new_metadata_id(theirs),
        )),
        ChangeType::Added => {
            if ours.new == theirs.new {
                // Independently created, byte-identical. Nothing to do.
                return Ok(None);
            }
            // Two different creations with no ancestor to merge through.
            Ok(Some(MergeEvent::Conflicted(Conflict::content(
                path,
                ObjectId::null(),
                ours.new_object_id(),
                theirs.new_object_id(),
            ))))
        }
        ChangeType::Modified if is_tree => Ok(classify_tree(
            path,
            old_metadata_id(ours),
            new_metadata_id(ours),
            new_metadata_id(theirs),
        )),
        ChangeType::Modified => classify_modified_feature(repo, ours, theirs),
    }
}

fn classify_tree(
    path: &str,
    ancestor: ObjectId,
    ours: ObjectId,
    theirs: ObjectId,
) -> Option<MergeEvent> {
    if ours == theirs {
        return None;
    }
    Some(MergeEvent::Conflicted(Conflict::schema(
        path, ancestor, ours, theirs,
    )))
}

fn classify_modified_feature<R: Repository>(
    repo: &R,
    ours: &DiffEntry,
    theirs: &DiffEntry,
) -> Result<Option<MergeEvent>, MergeError> {
    let path = ours.path();

    if ours.new == theirs.new {
        // Convergent edits; ours already holds the result.
        return Ok(None);
    }

    let ours_schema_id = new_metadata_id(ours);
    let theirs_schema_id = new_metadata_id(theirs);
    if ours_schema_id != theirs_schema_id {
        // Attribute-level reconciliation is meaningless across schemas.
        return Ok(Some(MergeEvent::Conflicted(Conflict::content(
            path,
            ours.old_object_id(),
            ours.new_object_id(),
            theirs.new_object_id(),
        ))));
    }

    let ancestor = repo.feature(&ours.old_object_id())?;
    let ours_feature = repo.feature(&ours.new_object_id())?;
    let theirs_feature = repo.feature(&theirs.new_object_id())?;
    let schema = repo.schema(&ours_schema_id)?;

    let ours_diff = FeatureDiff::between(&schema, &ancestor, &ours_feature);
    let theirs_diff = FeatureDiff::between(&schema, &ancestor, &theirs_feature);
    if ours_diff.conflicts_with(&theirs_diff, &schema) {
        return Ok(Some(MergeEvent::Conflicted(Conflict::content(
            path,
            ours.old_object_id(),
            ours.new_object_id(),
            theirs.new_object_id(),
        ))));
    }

    let merged = merge_features(&schema, &ancestor, &ours_feature, &theirs_feature);
    if merged.id() == theirs.new_object_id() {
        // Reconciliation reproduced theirs exactly; report it as a plain
        // change instead of a merged record.
        return Ok(Some(MergeEvent::Unconflicted(theirs.clone())));
    }
    Ok(Some(MergeEvent::Merged(FeatureInfo::new(
        path,
        merged,
        ours_schema_id,
    ))))
}

fn new_metadata_id(entry: &DiffEntry) -> ObjectId {
    entry
        .new
        .as_ref()
        .map_or_else(ObjectId::null, |r| r.metadata_id.clone())
}

fn old_metadata_id(entry: &DiffEntry) -> ObjectId {
    entry
        .old
        .as_ref()
        .map_or_else(ObjectId::null, |r| r.metadata_id.clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
