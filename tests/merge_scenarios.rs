//! Integration tests for merge scenarios over the in-memory repository.
//!
//! Each test builds a small revision graph — a base snapshot plus two
//! branches — runs the full ancestor → diff → join → classify pipeline, and
//! checks the streamed results.
//!
//! Coverage:
//! - disjoint paths: every change from the merged branch applies cleanly
//! - disjoint attribute edits to one feature: one reconciled record
//! - same attribute edited divergently: content conflict
//! - geometry edited on both sides: edit-script merge, or silent keep-ours
//! - convergent edits: no event, or collapse to an unconflicted change
//! - both branches deleting the same feature: no event
//! - delete-vs-modify: content conflict
//! - layer schema divergence: schema conflict
//! - status builder: working copy, staging, conflict store, merge message
//! - re-running a scenario yields the identical result

use strata::merge::MergeScenario;
use strata::merge::status::MergeStatusBuilder;
use strata::repo::ConflictStore;
use strata::repo::memory::{
    MemoryConflictStore, MemoryRepo, MemoryStagingArea, MemoryWorkingCopy,
};
use strata::{
    AttributeDescriptor, AttributeKind, ChangeType, CollectingConsumer, Coord, Feature, Geometry,
    MergeConfig, MergeScenarioReport, RevisionId, Schema, Value,
};

fn roads_schema() -> Schema {
    Schema::new(
        "roads",
        vec![
            AttributeDescriptor::new("name", AttributeKind::Text),
            AttributeDescriptor::new("lanes", AttributeKind::Int),
            AttributeDescriptor::new("geom", AttributeKind::Geometry),
        ],
    )
}

fn road(name: &str, lanes: i64, geom: Geometry) -> Feature {
    Feature::new(vec![Value::from(name), Value::Int(lanes), Value::from(geom)])
}

fn point(x: f64, y: f64) -> Geometry {
    Geometry::point(x, y)
}

fn line(coords: &[(f64, f64)]) -> Geometry {
    Geometry::line_string(coords.iter().map(|&(x, y)| Coord::new(x, y)).collect())
}

/// Env-filtered log output for debugging failing scenarios; safe to call
/// from every test.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Run the scenario into a fresh collecting consumer.
fn run(
    repo: &MemoryRepo,
    merge_into: &RevisionId,
    to_merge: &RevisionId,
) -> (MergeScenarioReport, CollectingConsumer) {
    init_tracing();
    let mut consumer = CollectingConsumer::new();
    let report = MergeScenario::new(repo, merge_into.clone(), to_merge.clone())
        .report_to(&mut consumer)
        .expect("scenario must complete");
    assert!(consumer.finished, "finished must always fire");
    (report, consumer)
}

#[test]
fn disjoint_paths_apply_cleanly() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("main st", 2, point(0.0, 0.0)))
        .commit();
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r2", &s, road("our st", 2, point(1.0, 0.0)))
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r3", &s, road("their st", 2, point(2.0, 0.0)))
        .commit();

    let (report, consumer) = run(&repo, &ours, &theirs);
    assert!(report.is_clean());
    assert!(consumer.conflicts.is_empty());
    assert!(consumer.merged.is_empty());
    // Their feature addition plus the layer tree change.
    let feature_changes: Vec<&str> = consumer
        .unconflicted
        .iter()
        .map(strata::DiffEntry::path)
        .filter(|p| p.contains('/'))
        .collect();
    assert_eq!(feature_changes, vec!["roads/r3"]);
}

#[test]
fn disjoint_attribute_edits_reconcile_into_one_record() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, point(0.0, 0.0)))
        .commit();
    // Ours renames; theirs moves the geometry.
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("B", 2, point(0.0, 0.0)))
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("A", 2, point(1.0, 1.0)))
        .commit();

    let (report, consumer) = run(&repo, &ours, &theirs);
    assert_eq!(report.merged, 1);
    assert_eq!(report.conflicts, 0);
    let info = &consumer.merged[0];
    assert_eq!(info.path, "roads/r1");
    assert_eq!(info.feature, road("B", 2, point(1.0, 1.0)));
    assert_eq!(info.schema_id, s.id());
}

#[test]
fn same_attribute_divergence_is_a_content_conflict() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, point(0.0, 0.0)))
        .commit();
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("B", 2, point(0.0, 0.0)))
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("C", 2, point(0.0, 0.0)))
        .commit();

    let (report, consumer) = run(&repo, &ours, &theirs);
    assert_eq!(report.conflicts, 1);
    let conflict = &consumer.conflicts[0];
    assert_eq!(conflict.path, "roads/r1");
    assert!(!conflict.is_schema());
    assert_eq!(
        conflict.kind.ancestor(),
        &road("A", 2, point(0.0, 0.0)).id()
    );
    assert_eq!(conflict.kind.ours(), &road("B", 2, point(0.0, 0.0)).id());
    assert_eq!(conflict.kind.theirs(), &road("C", 2, point(0.0, 0.0)).id());
}

#[test]
fn divergent_geometry_edits_merge_via_edit_script() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let ancestor_geom = line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, ancestor_geom))
        .commit();
    // Ours nudges the middle vertex; theirs extends the line.
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("A", 2, line(&[(0.0, 0.0), (1.0, 5.0), (2.0, 2.0)])))
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature(
            "roads",
            "r1",
            &s,
            road("A", 2, line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)])),
        )
        .commit();

    let (report, consumer) = run(&repo, &ours, &theirs);
    assert_eq!(report.conflicts, 0);
    assert_eq!(report.merged, 1);
    assert_eq!(
        consumer.merged[0].feature,
        road("A", 2, line(&[(0.0, 0.0), (1.0, 5.0), (2.0, 2.0), (3.0, 3.0)]))
    );
}

#[test]
fn failed_geometry_patch_keeps_ours_without_conflict() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)])))
        .commit();
    // Ours edits the vertex theirs deletes; the patch cannot apply.
    let ours_geom = line(&[(0.0, 0.0), (1.0, 5.0), (2.0, 2.0)]);
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("A", 2, ours_geom.clone()))
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("A", 4, line(&[(0.0, 0.0), (2.0, 2.0)])))
        .commit();

    let (report, consumer) = run(&repo, &ours, &theirs);
    assert_eq!(report.conflicts, 0);
    assert_eq!(report.merged, 1);
    // Theirs' lane change lands; ours' geometry survives untouched.
    assert_eq!(consumer.merged[0].feature, road("A", 4, ours_geom));
}

#[test]
fn convergent_edits_produce_no_events() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, point(0.0, 0.0)))
        .commit();
    let converged = road("B", 2, point(0.0, 0.0));
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, converged.clone())
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, converged)
        .commit();

    let (report, _) = run(&repo, &ours, &theirs);
    assert_eq!(report.total(), 0);
}

#[test]
fn reconciliation_collapsing_to_theirs_reports_unconflicted() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, point(0.0, 0.0)))
        .commit();
    // Ours renames; theirs makes the same rename plus a lane change, so the
    // reconciled record is exactly theirs.
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("B", 2, point(0.0, 0.0)))
        .commit();
    let theirs_feature = road("B", 4, point(0.0, 0.0));
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, theirs_feature.clone())
        .commit();

    let (report, consumer) = run(&repo, &ours, &theirs);
    assert_eq!(report.merged, 0);
    assert_eq!(report.conflicts, 0);
    let change = consumer
        .unconflicted
        .iter()
        .find(|e| e.path() == "roads/r1")
        .expect("the collapsed change must be reported");
    assert_eq!(change.change_type(), ChangeType::Modified);
    assert_eq!(change.new_object_id(), theirs_feature.id());
}

#[test]
fn both_branches_deleting_is_silent() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, point(0.0, 0.0)))
        .feature("roads", "r2", &s, road("B", 2, point(1.0, 0.0)))
        .commit();
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .remove("roads/r1")
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .remove("roads/r1")
        .commit();

    let (report, consumer) = run(&repo, &ours, &theirs);
    assert_eq!(report.conflicts, 0);
    assert!(
        consumer.unconflicted.iter().all(|e| e.path() != "roads/r1"),
        "a doubly-deleted path must not be reported"
    );
}

#[test]
fn delete_versus_modify_conflicts() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, point(0.0, 0.0)))
        .commit();
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .remove("roads/r1")
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("B", 2, point(0.0, 0.0)))
        .commit();

    let (report, consumer) = run(&repo, &ours, &theirs);
    assert_eq!(report.conflicts, 1);
    let conflict = &consumer.conflicts[0];
    assert_eq!(conflict.path, "roads/r1");
    assert!(conflict.kind.ours().is_null(), "ours deleted the feature");
}

#[test]
fn divergent_layer_schemas_conflict() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let widened = Schema::new(
        "roads",
        vec![
            AttributeDescriptor::new("name", AttributeKind::Text),
            AttributeDescriptor::new("lanes", AttributeKind::Int),
            AttributeDescriptor::new("surface", AttributeKind::Text),
            AttributeDescriptor::new("geom", AttributeKind::Geometry),
        ],
    );
    let renamed = Schema::new(
        "roads",
        vec![
            AttributeDescriptor::new("label", AttributeKind::Text),
            AttributeDescriptor::new("lanes", AttributeKind::Int),
            AttributeDescriptor::new("geom", AttributeKind::Geometry),
        ],
    );
    let base = repo.build_snapshot().layer("roads", &s).commit();
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .layer("roads", &widened)
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .layer("roads", &renamed)
        .commit();

    let (report, consumer) = run(&repo, &ours, &theirs);
    assert_eq!(report.conflicts, 1);
    let conflict = &consumer.conflicts[0];
    assert!(conflict.is_schema());
    assert_eq!(conflict.path, "roads");
    assert_eq!(conflict.kind.ancestor(), &s.id());
    assert_eq!(conflict.kind.ours(), &widened.id());
    assert_eq!(conflict.kind.theirs(), &renamed.id());
}

#[test]
fn scenario_is_repeatable() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, point(0.0, 0.0)))
        .feature("roads", "r2", &s, road("B", 2, point(1.0, 0.0)))
        .commit();
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("A2", 2, point(0.0, 0.0)))
        .remove("roads/r2")
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("A3", 2, point(0.0, 0.0)))
        .feature("roads", "r3", &s, road("C", 2, point(2.0, 0.0)))
        .commit();

    let (first_report, first) = run(&repo, &ours, &theirs);
    let (second_report, second) = run(&repo, &ours, &theirs);
    assert_eq!(first_report, second_report);
    assert_eq!(first.conflicts, second.conflicts);
    assert_eq!(first.unconflicted, second.unconflicted);
    assert_eq!(first.merged, second.merged);
}

#[test]
fn status_builder_persists_a_full_scenario() {
    let mut repo = MemoryRepo::new();
    let s = roads_schema();
    let base = repo
        .build_snapshot()
        .feature("roads", "r1", &s, road("A", 2, point(0.0, 0.0)))
        .feature("roads", "r2", &s, road("B", 2, point(1.0, 0.0)))
        .commit();
    // r1: disjoint attribute edits -> merged record.
    // r2: same attribute divergence -> conflict.
    // r3: only theirs -> unconflicted.
    let ours = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("A2", 2, point(0.0, 0.0)))
        .feature("roads", "r2", &s, road("B-ours", 2, point(1.0, 0.0)))
        .commit();
    let theirs = repo
        .build_snapshot()
        .parent(&base)
        .feature("roads", "r1", &s, road("A", 4, point(0.0, 0.0)))
        .feature("roads", "r2", &s, road("B-theirs", 2, point(1.0, 0.0)))
        .feature("roads", "r3", &s, road("C", 2, point(2.0, 0.0)))
        .commit();

    let mut working = MemoryWorkingCopy::new();
    let mut staging = MemoryStagingArea::new();
    let mut store = MemoryConflictStore::new();
    let config = MergeConfig {
        spill_chunk_size: 2,
        max_reported_conflicts: 25,
    };
    let mut builder =
        MergeStatusBuilder::new(&mut working, &mut staging, &mut store, "MERGE", &config);
    let report = MergeScenario::new(&repo, ours, theirs.clone())
        .report_to(&mut builder)
        .expect("scenario must complete");

    assert_eq!(report.conflicts, 1);
    assert_eq!(report.merged, 1);
    assert!(builder.is_changed());
    assert!(!builder.is_fast_forward());

    let message = builder.merge_message(&theirs);
    assert!(message.contains("Conflicts:"));
    assert!(message.contains("\troads/r2\n"));
    assert_eq!(
        builder.conflict_notice(),
        "Automatic merge failed. Fix conflicts and then commit the result.\n"
    );
    drop(builder);

    assert_eq!(working.inserted.len(), 1);
    assert_eq!(working.inserted[0].path, "roads/r1");
    assert_eq!(working.inserted[0].feature, road("A2", 4, point(0.0, 0.0)));

    assert!(staging.staged.iter().any(|e| e.path() == "roads/r3"));
    assert!(staging.staged.iter().all(|e| e.path() != "roads/r2"));

    let conflicts = store.get_conflicts("MERGE", None).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].path, "roads/r2");
}
