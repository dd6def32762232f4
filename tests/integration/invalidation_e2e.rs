//! End-to-end invalidation tests against real files and in-memory outputs.

use donkeykong::{
    enumerate_downstream, invalidate_downstream, BoundaryFamilies, Error, GraphIntegrityError,
    GraphTask, Invalidator, TaskId, TaskNode,
};

use crate::fixtures::{diamond, extract_id, Pipeline, DATES};

fn ids<T: TaskNode>(tasks: Vec<T>) -> Vec<String> {
    tasks.iter().map(|t| t.id().to_string()).collect()
}

/// Test: Full pipeline invalidation
/// Given a pipeline with every output on disk
/// When the graph's end tasks are invalidated without a boundary
/// Then every unprotected output is removed and raw data survives
#[test]
fn test_invalidate_whole_pipeline() {
    let pipeline = Pipeline::new();
    let end_tasks = pipeline.graph.end_tasks();
    assert_eq!(ids(end_tasks.clone()), vec!["Report"]);

    let report = invalidate_downstream(end_tasks, None).unwrap();

    assert!(pipeline.exists("raw.csv"), "Protected raw data must survive");
    for name in pipeline.outputs().iter().filter(|n| *n != "raw.csv") {
        assert!(!pipeline.exists(name), "{} should have been removed", name);
    }
    assert_eq!(report.tasks, 6);
    // transform/, load.db, load.ok and two extracts
    assert_eq!(report.removed, 5);
    assert_eq!(report.skipped_protected, 1);
}

/// Test: Traversal order
/// Given the pipeline graph
/// When enumerating from the end task
/// Then every task appears before its own dependencies
#[test]
fn test_pipeline_enumeration_is_preorder() {
    let pipeline = Pipeline::new();

    let tasks: Vec<_> = enumerate_downstream([pipeline.node("Report")], None)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        ids(tasks),
        vec![
            "Report".to_string(),
            "Load".to_string(),
            "Transform".to_string(),
            extract_id(DATES[0]),
            "RawData".to_string(),
            extract_id(DATES[1]),
        ]
    );
}

/// Test: Boundary stop
/// Given the pipeline graph
/// When invalidating Load with boundary family Transform
/// Then Load and Transform outputs are removed but extracts are kept
#[test]
fn test_boundary_family_stops_expansion() {
    let pipeline = Pipeline::new();
    let request = pipeline
        .request(&["Load"])
        .bounded_by(BoundaryFamilies::single("Transform"));

    let report = Invalidator::new().invalidate_downstream(&request).unwrap();

    assert!(!pipeline.exists("load.db"));
    assert!(!pipeline.exists("load.ok"));
    assert!(!pipeline.exists("transform"));
    for date in DATES {
        assert!(pipeline.exists(&format!("extract_{}.json", date)));
    }
    assert_eq!(report.tasks, 2);
}

/// Test: Boundary on an end task
/// Given a boundary family equal to the end task's family
/// Then only the end task is emitted for that pass
#[test]
fn test_boundary_matching_end_task_yields_only_it() {
    let pipeline = Pipeline::new();

    let tasks: Vec<_> = pipeline
        .request(&["Load"])
        .bounded_by(BoundaryFamilies::single("Load"))
        .downstream()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(ids(tasks), vec!["Load".to_string()]);
}

/// Test: Protected family
/// Given Extract is a protected family
/// When invalidating the whole pipeline
/// Then extract outputs stay on disk but the tasks are still traversed
#[test]
fn test_protected_family_survives_full_invalidation() {
    let pipeline = Pipeline::new();

    let report = Invalidator::new()
        .protect_family("Extract")
        .invalidate_downstream(&pipeline.request(&["Report"]))
        .unwrap();

    for date in DATES {
        assert!(pipeline.exists(&format!("extract_{}.json", date)));
    }
    assert!(!pipeline.exists("transform"));
    assert_eq!(report.skipped_tasks, 2);
    assert_eq!(report.tasks, 6);
}

/// Test: Idempotence
/// Given a pipeline that was already invalidated
/// When invalidating again
/// Then nothing is removed and no error is raised
#[test]
fn test_second_invalidation_is_noop() {
    let pipeline = Pipeline::new();
    let request = pipeline.request(&["Report"]);
    let invalidator = Invalidator::new();

    invalidator.invalidate_downstream(&request).unwrap();
    let second = invalidator.invalidate_downstream(&request).unwrap();

    assert_eq!(second.removed, 0);
    assert_eq!(second.missing, 5);
}

/// Test: Diamond dependency
/// Given A requires B and C, both requiring D
/// Then D is yielded and invalidated once
#[test]
fn test_diamond_visits_shared_dependency_once() {
    let (graph, outputs) = diamond();
    let a = graph.node(&TaskId::from("A")).unwrap();

    let tasks: Vec<_> = enumerate_downstream([a.clone()], None)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(ids(tasks), vec!["A", "B", "D", "C"]);

    invalidate_downstream([a], None).unwrap();
    for out in outputs.values() {
        assert_eq!(out.removals(), 1);
    }
}

/// Test: Repeated end tasks
/// Given the same end task listed twice
/// Then it is treated as one end task
#[test]
fn test_duplicate_end_tasks_are_merged() {
    let (graph, _) = diamond();
    let a = graph.node(&TaskId::from("A")).unwrap();

    let count = enumerate_downstream([a.clone(), a], None).count();
    assert_eq!(count, 4);
}

/// Test: Multiple end tasks
/// Given end tasks B and C sharing D
/// Then D is yielded once per end task
#[test]
fn test_shared_dependency_repeats_across_end_tasks() {
    let (graph, outputs) = diamond();
    let ends = graph
        .nodes(&[TaskId::from("B"), TaskId::from("C")])
        .unwrap();

    let tasks: Vec<_> = enumerate_downstream(ends.clone(), None)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(ids(tasks), vec!["B", "D", "C", "D"]);

    let report = invalidate_downstream(ends, None).unwrap();
    assert_eq!(report.tasks, 4);
    assert_eq!(outputs["D"].removals(), 1);
    assert_eq!(report.missing, 1);
    assert!(outputs["A"].is_present());
}

/// Test: Unknown task lookup
/// Given a graph handle request for a missing id
/// Then the error is a graph integrity error
#[test]
fn test_unknown_task_is_integrity_error() {
    let pipeline = Pipeline::new();
    let err = pipeline.graph.node(&TaskId::from("Nope")).unwrap_err();

    assert!(matches!(
        err,
        Error::GraphIntegrity(GraphIntegrityError::UnknownTask(_))
    ));
}

/// Test: Empty input
#[test]
fn test_empty_end_tasks() {
    let pipeline = Pipeline::new();
    let report = invalidate_downstream(Vec::<GraphTask>::new(), None).unwrap();

    assert_eq!(report.tasks, 0);
    assert!(pipeline.outputs().iter().all(|name| pipeline.exists(name)));
}
