//! Core identifier types for Strata.
//!
//! Foundation types used throughout the merge engine: content-addressed
//! object identifiers and revision identifiers. Both are validated string
//! newtypes so that malformed ids are rejected at the boundary instead of
//! surfacing as lookup failures deep inside a merge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// ObjectId
// ---------------------------------------------------------------------------

/// A validated 64-character lowercase hex content id (SHA-256).
///
/// The all-zeros id is the `NULL` sentinel meaning "this version did not
/// exist" — e.g. the ancestor side of a conflict on a path that both
/// branches created.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// The number of hex characters in an id.
    pub const HEX_LEN: usize = 64;

    /// Create a new `ObjectId` from a string, validating format.
    ///
    /// # Errors
    /// Returns an error if the string is not exactly 64 lowercase hex characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// The `NULL` sentinel id (all zeros): "did not exist".
    #[must_use]
    pub fn null() -> Self {
        Self("0".repeat(Self::HEX_LEN))
    }

    /// Returns `true` if this is the `NULL` sentinel.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    /// Content-address a byte buffer.
    #[must_use]
    pub fn hash_of(bytes: &[u8]) -> Self {
        use fmt::Write;
        let digest = Sha256::digest(bytes);
        let mut hex = String::with_capacity(Self::HEX_LEN);
        for byte in digest {
            // Writing hex into a String cannot fail.
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Return the inner hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        if s.len() != Self::HEX_LEN {
            return Err(ValidationError {
                kind: ErrorKind::ObjectId,
                value: s.to_owned(),
                reason: format!("expected {} hex characters, got {}", Self::HEX_LEN, s.len()),
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        {
            return Err(ValidationError {
                kind: ErrorKind::ObjectId,
                value: s.to_owned(),
                reason: "must contain only lowercase hex characters (0-9, a-f)".to_owned(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// RevisionId
// ---------------------------------------------------------------------------

/// A revision identifier — a newtype over [`ObjectId`] naming one commit in
/// the revision graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId(ObjectId);

impl RevisionId {
    /// Create a new `RevisionId` from a hex string.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid object id.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let id = ObjectId::new(s).map_err(|mut e| {
            e.kind = ErrorKind::RevisionId;
            e
        })?;
        Ok(Self(id))
    }

    /// Return the inner [`ObjectId`].
    #[must_use]
    pub const fn id(&self) -> &ObjectId {
        &self.0
    }

    /// Return the hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RevisionId {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RevisionId {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<RevisionId> for String {
    fn from(rev: RevisionId) -> Self {
        rev.0.into()
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// The kind of value that failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An [`ObjectId`] validation error.
    ObjectId,
    /// A [`RevisionId`] validation error.
    RevisionId,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectId => write!(f, "ObjectId"),
            Self::RevisionId => write!(f, "RevisionId"),
        }
    }
}

/// A validation error for Strata core types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    /// What kind of value was being validated.
    pub kind: ErrorKind,
    /// The invalid value.
    pub value: String,
    /// Human-readable explanation.
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}: {}", self.kind, self.value, self.reason)
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
