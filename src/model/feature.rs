//! Features and schemas.
//!
//! A [`Schema`] declares an ordered list of named, typed attributes; a
//! [`Feature`] is one record conforming to a schema, holding its values in
//! the schema's declared order. Both are content-addressed: the id of a
//! feature or schema is the SHA-256 of its canonical JSON encoding, which is
//! what makes "the reconciled record equals theirs" a cheap id comparison.

use serde::{Deserialize, Serialize};

use super::types::ObjectId;
use super::value::Value;

// ---------------------------------------------------------------------------
// AttributeKind / AttributeDescriptor
// ---------------------------------------------------------------------------

/// The declared type of an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Bool,
    Int,
    Float,
    Text,
    Geometry,
}

/// One named, typed slot in a [`Schema`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
}

impl AttributeDescriptor {
    #[must_use]
    pub fn new(name: &str, kind: AttributeKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
        }
    }

    /// Returns `true` if this attribute holds a geometry value.
    #[must_use]
    pub fn is_geometry(&self) -> bool {
        self.kind == AttributeKind::Geometry
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// The shape a feature conforms to: a name plus ordered attribute slots.
///
/// Attribute order is significant — it fixes the value order inside every
/// conforming [`Feature`] and the deterministic iteration order of the
/// attribute-level merge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub attributes: Vec<AttributeDescriptor>,
}

impl Schema {
    #[must_use]
    pub fn new(name: &str, attributes: Vec<AttributeDescriptor>) -> Self {
        Self {
            name: name.to_owned(),
            attributes,
        }
    }

    /// Content id of this schema.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId::hash_of(&serde_json::to_vec(self).unwrap_or_default())
    }

    /// Number of declared attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if the schema declares no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Index of the attribute with the given name, if declared.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }
}

// ---------------------------------------------------------------------------
// Feature
// ---------------------------------------------------------------------------

/// One record: attribute values in schema order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub values: Vec<Value>,
}

impl Feature {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Content id of this feature.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId::hash_of(&serde_json::to_vec(self).unwrap_or_default())
    }

    /// Value at attribute position `i`, or [`Value::Null`] past the end.
    ///
    /// Out-of-range reads behave like an unset attribute so that features
    /// written against an older, shorter schema revision still diff cleanly.
    #[must_use]
    pub fn get(&self, i: usize) -> &Value {
        self.values.get(i).unwrap_or(&Value::Null)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the feature has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FeatureInfo
// ---------------------------------------------------------------------------

/// The materialized result of a successful automatic reconciliation: a new
/// feature, the schema it conforms to, and the path it belongs at.
///
/// Only produced when the reconciled record differs from both inputs; when
/// reconciliation reproduces "theirs" exactly the change is reported as
/// unconflicted instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    /// Full path of the record in the tree.
    pub path: String,
    /// The reconciled record.
    pub feature: Feature,
    /// Content id of the schema the record conforms to.
    pub schema_id: ObjectId,
}

impl FeatureInfo {
    #[must_use]
    pub fn new(path: &str, feature: Feature, schema_id: ObjectId) -> Self {
        Self {
            path: path.to_owned(),
            feature,
            schema_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
