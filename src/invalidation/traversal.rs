//! Downstream dependency discovery.
//!
//! Walks the "requires" relation from a set of end tasks towards the roots of
//! the graph. The walk is a depth-first search that yields every task before
//! its own dependencies, and only asks a task for its dependencies once the
//! consumer pulls past it. Listing dependencies may be expensive in the
//! external pipeline (it can instantiate tasks or hit storage), so nothing is
//! materialized ahead of time.
//!
//! # Passes
//!
//! Without boundary families there is one pass per end task. With boundary
//! families there is one pass per `(family, end task)` pair, families in
//! order. Each pass has its own visited set: within a pass a task is yielded
//! at most once, across passes the same task may be yielded again.

use std::collections::{HashSet, VecDeque};
use std::iter::FusedIterator;

use crate::core::task::{TaskId, TaskNode};
use crate::error::{GraphIntegrityError, Result};
use crate::invalidation::request::{dedup_tasks, BoundaryFamilies};
use crate::dklog_trace;

/// Enumerate every task the end tasks transitively require.
///
/// Tasks whose family is a boundary family are yielded but not expanded.
pub fn enumerate_downstream<T, I>(
    end_tasks: I,
    boundary: Option<&BoundaryFamilies>,
) -> Downstream<T>
where
    T: TaskNode,
    I: IntoIterator<Item = T>,
{
    Downstream::new(dedup_tasks(end_tasks), boundary)
}

struct Pass<T> {
    boundary: Option<String>,
    root: T,
}

struct Frame<T> {
    id: TaskId,
    deps: std::vec::IntoIter<T>,
}

/// Lazy, non-restartable sequence of downstream tasks.
///
/// Yields `Err` at most once (cycle or failing dependency listing) and is
/// exhausted afterwards.
pub struct Downstream<T: TaskNode> {
    passes: VecDeque<Pass<T>>,
    boundary: Option<String>,
    visited: HashSet<TaskId>,
    /// Tasks on the current DFS path, used for cycle detection.
    path: HashSet<TaskId>,
    stack: Vec<Frame<T>>,
    /// Last yielded task, expanded on the next pull.
    pending: Option<T>,
    done: bool,
}

impl<T: TaskNode> Downstream<T> {
    pub(crate) fn new(end_tasks: Vec<T>, boundary: Option<&BoundaryFamilies>) -> Self {
        let passes = match boundary {
            None => end_tasks
                .into_iter()
                .map(|root| Pass {
                    boundary: None,
                    root,
                })
                .collect(),
            Some(families) => families
                .iter()
                .flat_map(|family| {
                    end_tasks.iter().map(move |root| Pass {
                        boundary: Some(family.to_string()),
                        root: root.clone(),
                    })
                })
                .collect(),
        };

        Self {
            passes,
            boundary: None,
            visited: HashSet::new(),
            path: HashSet::new(),
            stack: Vec::new(),
            pending: None,
            done: false,
        }
    }

    fn stops_at(&self, task: &T) -> bool {
        self.boundary
            .as_deref()
            .is_some_and(|family| task.family() == family)
    }

    fn expand(&mut self, task: T) -> Result<()> {
        let deps = if self.stops_at(&task) {
            Vec::new()
        } else {
            task.dependencies()?
        };
        let id = task.id();
        self.path.insert(id.clone());
        self.stack.push(Frame {
            id,
            deps: deps.into_iter(),
        });
        Ok(())
    }

    fn begin(&mut self, pass: Pass<T>) -> T {
        dklog_trace!(
            "downstream pass: root={} boundary={:?}",
            pass.root.id(),
            pass.boundary
        );
        self.boundary = pass.boundary;
        self.visited.clear();
        self.path.clear();
        self.visited.insert(pass.root.id());
        self.pending = Some(pass.root.clone());
        pass.root
    }

    fn fail(&mut self, err: crate::Error) -> Option<Result<T>> {
        self.done = true;
        self.stack.clear();
        self.passes.clear();
        Some(Err(err))
    }
}

impl<T: TaskNode> Iterator for Downstream<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(task) = self.pending.take() {
                if let Err(e) = self.expand(task) {
                    return self.fail(e);
                }
            }

            let Some(frame) = self.stack.last_mut() else {
                match self.passes.pop_front() {
                    Some(pass) => return Some(Ok(self.begin(pass))),
                    None => {
                        self.done = true;
                        return None;
                    }
                }
            };

            match frame.deps.next() {
                Some(dep) => {
                    let id = dep.id();
                    if self.path.contains(&id) {
                        return self.fail(GraphIntegrityError::Cycle { task: id }.into());
                    }
                    if !self.visited.insert(id) {
                        continue;
                    }
                    self.pending = Some(dep.clone());
                    return Some(Ok(dep));
                }
                None => {
                    if let Some(frame) = self.stack.pop() {
                        self.path.remove(&frame.id);
                    }
                }
            }
        }
    }
}

impl<T: TaskNode> FusedIterator for Downstream<T> {}
