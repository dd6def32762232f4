//! Request values describing what to invalidate.

use std::collections::HashSet;

use crate::core::task::TaskNode;
use crate::invalidation::traversal::Downstream;
use crate::{Error, Result};

/// Family names at which dependency expansion stops.
///
/// Never empty and free of duplicates; order is kept because each family
/// gets its own traversal pass, emitted in this order. "No boundary" is
/// expressed as `Option::None`, never as an empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryFamilies(Vec<String>);

impl BoundaryFamilies {
    pub fn new<I, S>(families: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let families: Vec<String> = families
            .into_iter()
            .map(Into::into)
            .filter(|family| seen.insert(family.clone()))
            .collect();

        if families.is_empty() {
            return Err(Error::Validation(
                "boundary families must name at least one family".to_string(),
            ));
        }
        Ok(Self(families))
    }

    pub fn single(family: impl Into<String>) -> Self {
        Self(vec![family.into()])
    }

    /// Parse a comma-separated family filter, as given on a command line.
    ///
    /// Blank input means no filter.
    pub fn parse(arg: &str) -> Result<Option<Self>> {
        let families: Vec<&str> = arg
            .split(',')
            .map(str::trim)
            .filter(|family| !family.is_empty())
            .collect();

        if families.is_empty() {
            if arg.trim().is_empty() {
                return Ok(None);
            }
            return Err(Error::Validation(format!(
                "invalid family filter: {:?}",
                arg
            )));
        }
        Self::new(families).map(Some)
    }

    pub fn contains(&self, family: &str) -> bool {
        self.0.iter().any(|f| f == family)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for BoundaryFamilies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// One invalidation invocation: the end tasks and where to stop.
#[derive(Debug, Clone)]
pub struct InvalidationRequest<T> {
    end_tasks: Vec<T>,
    boundary: Option<BoundaryFamilies>,
}

impl<T: TaskNode> InvalidationRequest<T> {
    /// End tasks are treated as a set: repeated ids keep their first position.
    pub fn new(end_tasks: impl IntoIterator<Item = T>) -> Self {
        Self {
            end_tasks: dedup_tasks(end_tasks),
            boundary: None,
        }
    }

    pub fn with_boundary(mut self, boundary: Option<BoundaryFamilies>) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn bounded_by(self, boundary: BoundaryFamilies) -> Self {
        self.with_boundary(Some(boundary))
    }

    pub fn end_tasks(&self) -> &[T] {
        &self.end_tasks
    }

    pub fn boundary(&self) -> Option<&BoundaryFamilies> {
        self.boundary.as_ref()
    }

    /// Lazily enumerate the tasks covered by this request.
    pub fn downstream(&self) -> Downstream<T> {
        Downstream::new(self.end_tasks.clone(), self.boundary.as_ref())
    }
}

pub(crate) fn dedup_tasks<T: TaskNode>(tasks: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    tasks
        .into_iter()
        .filter(|task| seen.insert(task.id()))
        .collect()
}
