//! Completion statistics over the downstream set.
//!
//! Counts are additive over traversal emissions. When several boundary
//! families or end tasks reach the same task, that task is counted once per
//! emission. This mirrors how the downstream sequence is defined and is kept
//! on purpose: callers that want distinct tasks can de-duplicate the
//! sequence themselves.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::task::TaskNode;
use crate::invalidation::request::{BoundaryFamilies, InvalidationRequest};
use crate::invalidation::traversal::enumerate_downstream;
use crate::Result;

/// Completion counts for one task family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyStats {
    pub family: String,
    pub complete: usize,
    pub incomplete: usize,
}

impl FamilyStats {
    pub fn new(family: &str) -> Self {
        Self {
            family: family.to_string(),
            complete: 0,
            incomplete: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.complete + self.incomplete
    }
}

/// Per-family statistics, in the order families were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsTable {
    rows: Vec<FamilyStats>,
}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, family: &str, complete: bool) {
        let position = match self.rows.iter().position(|row| row.family == family) {
            Some(position) => position,
            None => {
                self.rows.push(FamilyStats::new(family));
                self.rows.len() - 1
            }
        };

        let row = &mut self.rows[position];
        if complete {
            row.complete += 1;
        } else {
            row.incomplete += 1;
        }
    }

    pub fn get(&self, family: &str) -> Option<&FamilyStats> {
        self.rows.iter().find(|row| row.family == family)
    }

    pub fn rows(&self) -> &[FamilyStats] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_complete(&self) -> usize {
        self.rows.iter().map(|row| row.complete).sum()
    }

    pub fn total_incomplete(&self) -> usize {
        self.rows.iter().map(|row| row.incomplete).sum()
    }

    pub fn into_map(self) -> HashMap<String, FamilyStats> {
        self.rows
            .into_iter()
            .map(|row| (row.family.clone(), row))
            .collect()
    }
}

const HEADERS: [&str; 3] = ["Task", "Complete", "Incomplete"];

/// Plain text table: header, dashed rule, one row per family.
impl fmt::Display for StatsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 3]> = self
            .rows
            .iter()
            .map(|row| {
                [
                    row.family.clone(),
                    row.complete.to_string(),
                    row.incomplete.to_string(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let [w0, w1, w2] = widths;
        writeln!(f, "{:<w0$}  {:>w1$}  {:>w2$}", HEADERS[0], HEADERS[1], HEADERS[2])?;
        write!(f, "{}  {}  {}", "-".repeat(w0), "-".repeat(w1), "-".repeat(w2))?;
        for [family, complete, incomplete] in &cells {
            write!(f, "\n{:<w0$}  {:>w1$}  {:>w2$}", family, complete, incomplete)?;
        }
        Ok(())
    }
}

/// Classify every downstream task by completion, per family.
///
/// Grouping tasks have nothing to invalidate and are left out.
pub fn compute_stats<T, I>(end_tasks: I, boundary: Option<&BoundaryFamilies>) -> Result<StatsTable>
where
    T: TaskNode,
    I: IntoIterator<Item = T>,
{
    let mut table = StatsTable::new();
    for task in enumerate_downstream(end_tasks, boundary) {
        let task = task?;
        if task.is_grouping_node() {
            continue;
        }
        table.record(task.family(), task.is_complete()?);
    }
    Ok(table)
}

impl<T: TaskNode> InvalidationRequest<T> {
    /// Statistics for the tasks this request would invalidate.
    pub fn stats(&self) -> Result<StatsTable> {
        compute_stats(self.end_tasks().iter().cloned(), self.boundary())
    }
}
