//! Core domain models for donkeykong.
//!
//! This module contains the collaborator abstractions the invalidation engine
//! consumes (tasks and outputs), plus reference implementations of them: an
//! in-memory task graph and local/in-memory output targets.

pub mod dag;
pub mod output;
pub mod target;
pub mod task;

pub use dag::{GraphTask, TaskGraph, TaskSpec};
pub use output::{BackendError, Output, OutputRef, OutputTree};
pub use target::{LocalTarget, MemoryTarget};
pub use task::{TaskId, TaskKind, TaskNode};
