//! Output invalidation.
//!
//! Invalidating a task removes every unprotected output that currently
//! exists. Removal is idempotent: a second invalidation of the same task finds
//! nothing to remove. Backend failures are returned as-is; there is no retry
//! and no partial-failure recovery here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::task::TaskNode;
use crate::invalidation::request::{BoundaryFamilies, InvalidationRequest};
use crate::invalidation::traversal::enumerate_downstream;
use crate::{dklog_debug, dklog_trace, Error, Result};

/// Counters describing what an invalidation call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationReport {
    /// Tasks handed to the invalidation step (including repeats).
    pub tasks: usize,
    /// Tasks left alone because their family is protected.
    pub skipped_tasks: usize,
    /// Outputs that existed and were removed.
    pub removed: usize,
    /// Outputs skipped because they are protected.
    pub skipped_protected: usize,
    /// Outputs that were already absent.
    pub missing: usize,
    /// Set when a concurrent run was cancelled before finishing.
    #[serde(default)]
    pub cancelled: bool,
}

impl InvalidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: InvalidationReport) {
        self.tasks += other.tasks;
        self.skipped_tasks += other.skipped_tasks;
        self.removed += other.removed;
        self.skipped_protected += other.skipped_protected;
        self.missing += other.missing;
        self.cancelled |= other.cancelled;
    }

    /// Total outputs inspected.
    pub fn outputs_seen(&self) -> usize {
        self.removed + self.skipped_protected + self.missing
    }
}

/// Invalidation settings shared by the sequential and concurrent paths.
#[derive(Debug, Clone, Default)]
pub struct Invalidator {
    protected_families: HashSet<String>,
}

impl Invalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never invalidate tasks of this family. They are still traversed.
    pub fn protect_family(mut self, family: impl Into<String>) -> Self {
        self.protected_families.insert(family.into());
        self
    }

    pub fn protect_families<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_families
            .extend(families.into_iter().map(Into::into));
        self
    }

    pub fn is_protected_family(&self, family: &str) -> bool {
        self.protected_families.contains(family)
    }

    /// Remove every existing, unprotected output of `task`.
    pub fn invalidate<T: TaskNode>(&self, task: &T) -> Result<InvalidationReport> {
        let mut report = InvalidationReport::new();
        report.tasks = 1;

        if self.is_protected_family(task.family()) {
            dklog_debug!("invalidate: {} skipped (protected family)", task.id());
            report.skipped_tasks = 1;
            return Ok(report);
        }

        for output in task.outputs().flatten() {
            if output.is_protected() {
                dklog_trace!("invalidate: {} keeps protected {}", task.id(), output.describe());
                report.skipped_protected += 1;
                continue;
            }

            let exists = output
                .exists()
                .map_err(|e| Error::backend(output.describe(), e))?;
            if !exists {
                report.missing += 1;
                continue;
            }

            dklog_debug!("invalidate: {} removing {}", task.id(), output.describe());
            output
                .remove()
                .map_err(|e| Error::backend(output.describe(), e))?;
            report.removed += 1;
        }

        Ok(report)
    }

    /// Invalidate every task the request covers, in traversal order.
    ///
    /// Stops at the first traversal or backend error.
    pub fn invalidate_downstream<T: TaskNode>(
        &self,
        request: &InvalidationRequest<T>,
    ) -> Result<InvalidationReport> {
        self.invalidate_all(request.downstream())
    }

    pub(crate) fn invalidate_all<T, I>(&self, tasks: I) -> Result<InvalidationReport>
    where
        T: TaskNode,
        I: IntoIterator<Item = Result<T>>,
    {
        let mut report = InvalidationReport::new();
        for task in tasks {
            report.merge(self.invalidate(&task?)?);
        }
        dklog_debug!(
            "invalidate_downstream: tasks={} removed={} protected={} missing={}",
            report.tasks,
            report.removed,
            report.skipped_protected,
            report.missing
        );
        Ok(report)
    }
}

/// Remove every existing, unprotected output of `task`.
pub fn invalidate<T: TaskNode>(task: &T) -> Result<InvalidationReport> {
    Invalidator::new().invalidate(task)
}

/// Invalidate the end tasks and everything they transitively require,
/// stopping expansion at boundary families.
pub fn invalidate_downstream<T, I>(
    end_tasks: I,
    boundary: Option<&BoundaryFamilies>,
) -> Result<InvalidationReport>
where
    T: TaskNode,
    I: IntoIterator<Item = T>,
{
    Invalidator::new().invalidate_all(enumerate_downstream(end_tasks, boundary))
}
