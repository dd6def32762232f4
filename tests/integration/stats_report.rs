//! Completion statistics over real pipelines.

use donkeykong::{compute_stats, invalidate_downstream, BoundaryFamilies, Config, StatsTable};

use crate::fixtures::Pipeline;

/// Test: Stats on a fully built pipeline
/// Given every output exists
/// Then every non-grouping family is reported complete
#[test]
fn test_stats_before_and_after_invalidation() {
    let pipeline = Pipeline::new();

    let before = compute_stats([pipeline.node("Report")], None).unwrap();
    assert!(before.get("Report").is_none(), "Grouping tasks are not counted");
    assert_eq!(before.get("Extract").unwrap().complete, 2);
    assert_eq!(before.total_incomplete(), 0);

    invalidate_downstream([pipeline.node("Load")], None).unwrap();

    let after = pipeline.request(&["Report"]).stats().unwrap();
    assert_eq!(after.get("Load").unwrap().incomplete, 1);
    assert_eq!(after.get("Extract").unwrap().incomplete, 2);
    // Raw data is protected, so it is still there.
    assert_eq!(after.get("RawData").unwrap().complete, 1);
}

/// Test: Partial output set
/// Given Load lost one of its two outputs
/// Then Load is incomplete
#[test]
fn test_partial_outputs_count_as_incomplete() {
    let pipeline = Pipeline::new();
    std::fs::remove_file(pipeline.path("load.ok")).unwrap();

    let table = compute_stats([pipeline.node("Load")], None).unwrap();

    assert_eq!(table.get("Load").unwrap().incomplete, 1);
    assert_eq!(table.get("Transform").unwrap().complete, 1);
}

/// Test: Stats do not mutate
#[test]
fn test_stats_leave_outputs_alone() {
    let pipeline = Pipeline::new();
    compute_stats([pipeline.node("Report")], None).unwrap();

    assert!(pipeline.outputs().iter().all(|name| pipeline.exists(name)));
}

/// Test: Multiple boundary families
/// Given boundary families Transform and Extract
/// Then tasks reached in both passes are counted twice
#[test]
fn test_multi_boundary_counts_each_pass() {
    let pipeline = Pipeline::new();
    let boundary = BoundaryFamilies::parse("Transform, Extract").unwrap();

    let table = compute_stats([pipeline.node("Load")], boundary.as_ref()).unwrap();

    // Pass "Transform": Load, Transform. Pass "Extract": Load, Transform, 2x Extract.
    assert_eq!(table.get("Load").unwrap().total(), 2);
    assert_eq!(table.get("Transform").unwrap().total(), 2);
    assert_eq!(table.get("Extract").unwrap().total(), 2);
    assert!(table.get("RawData").is_none());
}

/// Test: Rendering
/// Then the table lists families in the order they were first seen
#[test]
fn test_rendered_table() {
    let pipeline = Pipeline::new();
    let boundary = BoundaryFamilies::single("Extract");
    invalidate_downstream([pipeline.node("Transform")], Some(&boundary)).unwrap();

    let table = compute_stats([pipeline.node("Load")], None).unwrap();

    let expected = "\
Task       Complete  Incomplete
---------  --------  ----------
Load              1           0
Transform         0           1
Extract           0           2
RawData           1           0";
    assert_eq!(table.to_string(), expected);
}

/// Test: JSON output
#[test]
fn test_stats_json_roundtrip() {
    let pipeline = Pipeline::new();
    let table = compute_stats([pipeline.node("Report")], None).unwrap();

    let json = serde_json::to_string(&table).unwrap();
    let parsed: StatsTable = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, table);
}

/// Test: Config-driven request
/// Given a config file naming a boundary family
/// When building a request from it
/// Then the request stops at that family
#[test]
fn test_request_from_config_file() {
    let pipeline = Pipeline::new();
    let path = pipeline.path("config.toml");
    std::fs::write(&path, "boundary_families = [\"Transform\"]\n").unwrap();

    let config = Config::load_from(&path).unwrap();
    let table = config
        .request([pipeline.node("Load")])
        .unwrap()
        .stats()
        .unwrap();

    assert!(table.get("Extract").is_none());
    assert_eq!(table.get("Transform").unwrap().complete, 1);
}
