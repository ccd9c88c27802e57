//! Strata: a three-way merge scenario engine for versioned feature trees.
//!
//! Given two revisions and their common ancestor, Strata pairs up the
//! changes both branches made — via a merge-join over two path-ordered diff
//! streams — classifies each path as silent, unconflicted, reconciled, or
//! conflicted, and streams the results to a consumer. Features that both
//! branches edited are reconciled attribute by attribute, with an
//! edit-script fallback for divergent geometry edits.
//!
//! The engine is storage-agnostic: repositories, conflict stores, working
//! copies, and staging areas are traits in [`repo`], with an in-memory
//! implementation under [`repo::memory`].

pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod repo;

pub use config::MergeConfig;
pub use error::MergeError;
pub use merge::MergeScenario;
pub use merge::report::{CollectingConsumer, MergeScenarioConsumer, MergeScenarioReport};
pub use merge::status::MergeStatusBuilder;
pub use model::conflict::{Conflict, ConflictKind};
pub use model::diff::{ChangeType, DiffEntry, NodeKind, NodeRef};
pub use model::feature::{AttributeDescriptor, AttributeKind, Feature, FeatureInfo, Schema};
pub use model::types::{ObjectId, RevisionId};
pub use model::value::{Coord, Geometry, GeometryKind, Value};
