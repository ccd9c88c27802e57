//! Attribute-level feature reconciliation.
//!
//! When both branches modify the same feature, the engine compares them
//! attribute by attribute against the common ancestor. Edits to disjoint
//! attributes compose into one merged record; edits of the same non-geometry
//! attribute to different values are a conflict. Geometry attributes get one
//! more chance: the ancestor-to-theirs edit script is replayed on top of
//! ours, and only if that patch fails cleanly does the merged record fall
//! back to ours' geometry — silently, matching long-standing merge
//! behavior.

use std::fmt;

use crate::error::MergeError;
use crate::model::feature::{Feature, Schema};
use crate::model::types::ObjectId;
use crate::model::value::Value;

use super::geometry::GeometryDiff;

// ---------------------------------------------------------------------------
// AttributeDiff / FeatureDiff
// ---------------------------------------------------------------------------

/// One changed attribute slot between two versions of a feature.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDiff {
    /// Position of the attribute in the schema.
    pub index: usize,
    /// Declared attribute name.
    pub name: String,
    /// Value in the older version.
    pub old: Value,
    /// Value in the newer version.
    pub new: Value,
}

/// The set of changed attributes between an ancestor feature and one side's
/// version of it.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureDiff {
    diffs: Vec<AttributeDiff>,
}

impl FeatureDiff {
    /// Diff `newer` against `older`, attribute by attribute in schema order.
    #[must_use]
    pub fn between(schema: &Schema, older: &Feature, newer: &Feature) -> Self {
        let diffs = schema
            .attributes
            .iter()
            .enumerate()
            .filter_map(|(index, descriptor)| {
                let old = older.get(index);
                let new = newer.get(index);
                (old != new).then(|| AttributeDiff {
                    index,
                    name: descriptor.name.clone(),
                    old: old.clone(),
                    new: new.clone(),
                })
            })
            .collect();
        Self { diffs }
    }

    /// The changed attributes, in schema order.
    #[must_use]
    pub fn diffs(&self) -> &[AttributeDiff] {
        &self.diffs
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// The same diff read in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            diffs: self
                .diffs
                .iter()
                .map(|d| AttributeDiff {
                    index: d.index,
                    name: d.name.clone(),
                    old: d.new.clone(),
                    new: d.old.clone(),
                })
                .collect(),
        }
    }

    /// Returns `true` if the two sides changed the same attribute to
    /// different values.
    ///
    /// Divergent geometry edits are not counted: those go through the
    /// edit-script fallback in [`merge_features`] instead of conflicting
    /// outright.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self, schema: &Schema) -> bool {
        self.diffs.iter().any(|mine| {
            other.diffs.iter().any(|theirs| {
                mine.index == theirs.index
                    && mine.new != theirs.new
                    && !schema
                        .attributes
                        .get(mine.index)
                        .is_some_and(crate::model::feature::AttributeDescriptor::is_geometry)
            })
        })
    }
}

impl fmt::Display for FeatureDiff {
    /// One line per changed attribute, for diff output and logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diff in &self.diffs {
            writeln!(f, "{}: {} -> {}", diff.name, diff.old, diff.new)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// merge_features
// ---------------------------------------------------------------------------

/// Compose both sides' attribute edits into one record.
///
/// Callers must have established via [`FeatureDiff::conflicts_with`] that no
/// non-geometry attribute was changed divergently. Per attribute:
/// ours-unchanged takes theirs; a non-geometry change on our side keeps ours;
/// divergent geometry edits replay the ancestor-to-theirs edit script on
/// ours, keeping ours untouched if the patch fails.
#[must_use]
pub fn merge_features(schema: &Schema, ancestor: &Feature, ours: &Feature, theirs: &Feature) -> Feature {
    let values = schema
        .attributes
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            let a = ancestor.get(index);
            let o = ours.get(index);
            let t = theirs.get(index);

            if o == a {
                return t.clone();
            }
            if !descriptor.is_geometry() || t == a || t == o {
                return o.clone();
            }
            // Both sides edited the geometry, differently.
            merge_geometry(a, o, t)
        })
        .collect();
    Feature::new(values)
}

fn merge_geometry(ancestor: &Value, ours: &Value, theirs: &Value) -> Value {
    let (Some(a), Some(o), Some(t)) = (
        ancestor.as_geometry(),
        ours.as_geometry(),
        theirs.as_geometry(),
    ) else {
        // One side replaced the geometry with null (or vice versa); there is
        // no coordinate sequence to patch, keep ours.
        return ours.clone();
    };
    match GeometryDiff::between(a, t).apply_to(o) {
        Some(merged) => Value::Geometry(merged),
        None => ours.clone(),
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Schema-checked entry point around [`merge_features`].
///
/// # Errors
/// Returns [`MergeError::SchemaMismatch`] when the two sides' schema ids
/// differ — the classifier routes those to a conflict before ever calling
/// this.
pub fn reconcile(
    path: &str,
    ours_schema_id: &ObjectId,
    theirs_schema_id: &ObjectId,
    schema: &Schema,
    ancestor: &Feature,
    ours: &Feature,
    theirs: &Feature,
) -> Result<Feature, MergeError> {
    if ours_schema_id != theirs_schema_id {
        return Err(MergeError::SchemaMismatch {
            path: path.to_owned(),
            ours: ours_schema_id.clone(),
            theirs: theirs_schema_id.clone(),
        });
    }
    Ok(merge_features(schema, ancestor, ours, theirs))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
