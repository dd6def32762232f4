//! Dependency-aware invalidation of task outputs.
//!
//! Given end tasks in a pipeline's task graph, donkeykong walks everything they
//! transitively require, removes the outputs of those tasks so they will be
//! rebuilt, and reports per-family completion statistics. Families listed as
//! boundary families stop the walk.

pub mod config;
pub mod core;
pub mod error;
pub mod invalidation;
pub mod log;
pub mod util;

pub use crate::core::{
    GraphTask, LocalTarget, MemoryTarget, Output, OutputRef, OutputTree, TaskGraph, TaskId,
    TaskKind, TaskNode, TaskSpec,
};
pub use config::Config;
pub use error::{Error, GraphIntegrityError, Result};
pub use invalidation::{
    compute_stats, enumerate_downstream, invalidate, invalidate_downstream,
    invalidate_downstream_concurrent, BoundaryFamilies, ConcurrentOptions, Downstream,
    FamilyStats, InvalidationReport, InvalidationRequest, Invalidator, StatsTable,
};
