//! Output handles and nested output declarations.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Error type returned by output backends.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Handle to a persisted artifact owned by a task.
///
/// `exists` and `remove` are each assumed to be atomic on the backend side.
/// `remove` must be idempotent: removing an artifact that is already gone is
/// not an error.
pub trait Output: Debug + Send + Sync {
    fn exists(&self) -> Result<bool, BackendError>;

    fn remove(&self) -> Result<(), BackendError>;

    /// Protected outputs are never removed by invalidation.
    fn is_protected(&self) -> bool {
        false
    }

    /// Human-readable location, used in errors and logs.
    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

/// Shared output handle.
pub type OutputRef = Arc<dyn Output>;

/// Output declaration of a task.
///
/// Tasks may declare a single output, a list, or a keyed map of outputs, and
/// those may nest. [`OutputTree::flatten`] turns any shape into a flat set.
#[derive(Debug, Clone, Default)]
pub enum OutputTree {
    #[default]
    Empty,
    Single(OutputRef),
    List(Vec<OutputTree>),
    Map(BTreeMap<String, OutputTree>),
}

impl OutputTree {
    pub fn single(output: impl Output + 'static) -> Self {
        OutputTree::Single(Arc::new(output))
    }

    pub fn list(outputs: impl IntoIterator<Item = OutputTree>) -> Self {
        OutputTree::List(outputs.into_iter().collect())
    }

    pub fn map<K: Into<String>>(outputs: impl IntoIterator<Item = (K, OutputTree)>) -> Self {
        OutputTree::Map(outputs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// All outputs in declaration order, each handle at most once.
    pub fn flatten(&self) -> Vec<OutputRef> {
        let mut flat: Vec<OutputRef> = Vec::new();
        self.collect_into(&mut flat);
        flat
    }

    fn collect_into(&self, flat: &mut Vec<OutputRef>) {
        match self {
            OutputTree::Empty => {}
            OutputTree::Single(output) => {
                if !flat.iter().any(|seen| Arc::ptr_eq(seen, output)) {
                    flat.push(Arc::clone(output));
                }
            }
            OutputTree::List(items) => {
                for item in items {
                    item.collect_into(flat);
                }
            }
            OutputTree::Map(items) => {
                for item in items.values() {
                    item.collect_into(flat);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flatten().is_empty()
    }
}

impl From<OutputRef> for OutputTree {
    fn from(output: OutputRef) -> Self {
        OutputTree::Single(output)
    }
}

impl From<Vec<OutputRef>> for OutputTree {
    fn from(outputs: Vec<OutputRef>) -> Self {
        OutputTree::List(outputs.into_iter().map(OutputTree::Single).collect())
    }
}
