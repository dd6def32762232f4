//! Task abstraction consumed by the invalidation engine.
//!
//! Tasks belong to an external pipeline graph. The engine only needs a
//! handful of capabilities from them, captured by the [`TaskNode`] trait.

use serde::{Deserialize, Serialize};

use crate::core::output::OutputTree;
use crate::Result;

/// Unique identifier for a task within a graph.
///
/// Pipeline schedulers usually derive this from the family name and the task
/// parameters, e.g. `Aggregate(date=2024-01-01)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a task persists anything of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Task that writes its own outputs.
    #[default]
    Regular,
    /// Pass-through task that only groups other tasks. It has no real output.
    Grouping,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Regular => write!(f, "regular"),
            TaskKind::Grouping => write!(f, "grouping"),
        }
    }
}

/// A node of the external task graph.
///
/// Implementations are expected to be cheap handles (an `Arc`, an index into
/// a shared graph, ...) since the traversal clones them while walking.
/// `dependencies` may do real work, such as instantiating upstream tasks, and
/// is only called when the traversal actually expands the node.
pub trait TaskNode: Clone {
    fn id(&self) -> TaskId;

    /// Logical task type, independent of the task parameters.
    fn family(&self) -> &str;

    fn kind(&self) -> TaskKind;

    /// Declared outputs, possibly nested.
    fn outputs(&self) -> OutputTree;

    /// Tasks this task directly requires.
    fn dependencies(&self) -> Result<Vec<Self>>;

    fn is_complete(&self) -> Result<bool>;

    fn is_grouping_node(&self) -> bool {
        self.kind() == TaskKind::Grouping
    }
}
