//! Data model for the merge engine.
//!
//! Identifier newtypes, attribute values and geometries, features and
//! schemas, change records, and conflict records. Everything here is an
//! immutable value type once constructed.

pub mod conflict;
pub mod diff;
pub mod feature;
pub mod types;
pub mod value;
