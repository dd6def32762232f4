//! In-memory task graph.
//!
//! This module provides the TaskGraph structure, a petgraph-backed
//! implementation of the task graph collaborator. Pipelines that already own
//! a graph implement [`TaskNode`] directly; TaskGraph is for callers that
//! want to describe their tasks and outputs up front.

use crate::core::output::{Output, OutputTree};
use crate::core::task::{TaskId, TaskKind, TaskNode};
use crate::error::{Error, GraphIntegrityError, Result};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use std::sync::Arc;

/// Description of a single task stored in the graph.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    /// Unique identifier for this task.
    pub id: TaskId,
    /// Family name shared by all tasks of the same type.
    pub family: String,
    pub kind: TaskKind,
    /// Declared outputs.
    pub outputs: OutputTree,
    /// Fixed completion state. When unset, completion is derived from the
    /// outputs (regular tasks) or the dependencies (grouping tasks).
    pub complete: Option<bool>,
}

impl TaskSpec {
    /// Create a regular task with no outputs.
    pub fn new(id: impl Into<TaskId>, family: &str) -> Self {
        Self {
            id: id.into(),
            family: family.to_string(),
            kind: TaskKind::Regular,
            outputs: OutputTree::Empty,
            complete: None,
        }
    }

    /// Create a grouping task.
    pub fn grouping(id: impl Into<TaskId>, family: &str) -> Self {
        Self {
            kind: TaskKind::Grouping,
            ..Self::new(id, family)
        }
    }

    /// Append a single output to the declaration.
    pub fn with_output(mut self, output: impl Output + 'static) -> Self {
        let added = OutputTree::single(output);
        self.outputs = match self.outputs {
            OutputTree::Empty => added,
            OutputTree::List(mut items) => {
                items.push(added);
                OutputTree::List(items)
            }
            other => OutputTree::List(vec![other, added]),
        };
        self
    }

    /// Replace the output declaration.
    pub fn with_outputs(mut self, outputs: OutputTree) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = Some(complete);
        self
    }
}

/// The task dependency graph.
///
/// An edge `from -> to` means `from` must complete before `to` can run, i.e.
/// `to` requires `from`.
pub struct TaskGraph {
    /// The underlying directed graph.
    graph: DiGraph<TaskSpec, ()>,
    /// Index mapping from TaskId to NodeIndex for fast lookups.
    task_index: HashMap<TaskId, NodeIndex>,
}

impl TaskGraph {
    /// Create a new empty TaskGraph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            task_index: HashMap::new(),
        }
    }

    /// Add a task to the graph.
    ///
    /// If a task with the same id already exists, the graph is unchanged and
    /// the existing NodeIndex is returned.
    pub fn add_task(&mut self, task: TaskSpec) -> NodeIndex {
        if let Some(&index) = self.task_index.get(&task.id) {
            return index;
        }

        let id = task.id.clone();
        let index = self.graph.add_node(task);
        self.task_index.insert(id, index);
        index
    }

    /// Add a dependency between two tasks.
    ///
    /// # Arguments
    /// * `from` - The task that must complete first (dependency)
    /// * `to` - The task that requires `from`
    ///
    /// # Errors
    /// Returns an error if:
    /// - Either task is not found in the graph
    /// - The edge already exists
    /// - Adding the edge would create a cycle
    pub fn add_dependency(&mut self, from: &TaskId, to: &TaskId) -> Result<()> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;

        if self.graph.find_edge(from_index, to_index).is_some() {
            return Err(Error::Validation(format!(
                "Dependency from {} to {} already exists",
                from, to
            )));
        }

        // Temporarily add the edge to check for cycles
        let edge = self.graph.add_edge(from_index, to_index, ());

        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(Error::Validation(format!(
                "Adding dependency from {} to {} would create a cycle",
                from, to
            )));
        }

        Ok(())
    }

    fn index_of(&self, id: &TaskId) -> Result<NodeIndex> {
        self.task_index
            .get(id)
            .copied()
            .ok_or_else(|| GraphIntegrityError::UnknownTask(id.clone()).into())
    }

    /// Get the number of tasks in the graph.
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of dependencies (edges) in the graph.
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Handles for the tasks nothing else requires, in insertion order.
    ///
    /// These are the natural end tasks of the pipeline.
    pub fn end_tasks(self: &Arc<Self>) -> Vec<GraphTask> {
        self.graph
            .node_indices()
            .filter(|&index| {
                self.graph
                    .neighbors_directed(index, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|index| GraphTask {
                graph: Arc::clone(self),
                index,
            })
            .collect()
    }

    /// Handle to a task usable by the invalidation engine.
    pub fn node(self: &Arc<Self>, id: &TaskId) -> Result<GraphTask> {
        let index = self.index_of(id)?;
        Ok(GraphTask {
            graph: Arc::clone(self),
            index,
        })
    }

    /// Handles for several tasks, failing on the first unknown id.
    pub fn nodes<'a>(
        self: &Arc<Self>,
        ids: impl IntoIterator<Item = &'a TaskId>,
    ) -> Result<Vec<GraphTask>> {
        ids.into_iter().map(|id| self.node(id)).collect()
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}

/// Cheap, cloneable handle to a task inside a shared [`TaskGraph`].
#[derive(Clone)]
pub struct GraphTask {
    graph: Arc<TaskGraph>,
    index: NodeIndex,
}

impl GraphTask {
    pub fn spec(&self) -> &TaskSpec {
        &self.graph.graph[self.index]
    }
}

impl std::fmt::Debug for GraphTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GraphTask").field(&self.spec().id).finish()
    }
}

impl TaskNode for GraphTask {
    fn id(&self) -> TaskId {
        self.spec().id.clone()
    }

    fn family(&self) -> &str {
        &self.spec().family
    }

    fn kind(&self) -> TaskKind {
        self.spec().kind
    }

    fn outputs(&self) -> OutputTree {
        self.spec().outputs.clone()
    }

    fn dependencies(&self) -> Result<Vec<Self>> {
        let mut deps: Vec<NodeIndex> = self
            .graph
            .graph
            .neighbors_directed(self.index, Direction::Incoming)
            .collect();
        deps.reverse();

        Ok(deps
            .into_iter()
            .map(|index| GraphTask {
                graph: Arc::clone(&self.graph),
                index,
            })
            .collect())
    }

    fn is_complete(&self) -> Result<bool> {
        let spec = self.spec();
        if let Some(complete) = spec.complete {
            return Ok(complete);
        }

        match spec.kind {
            TaskKind::Grouping => {
                for dep in self.dependencies()? {
                    if !dep.is_complete()? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            TaskKind::Regular => {
                let outputs = spec.outputs.flatten();
                // A task that declares nothing can never be complete.
                if outputs.is_empty() {
                    return Ok(false);
                }
                for output in outputs {
                    let exists = output
                        .exists()
                        .map_err(|e| Error::backend(output.describe(), e))?;
                    if !exists {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}
