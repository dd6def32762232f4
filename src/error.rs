use thiserror::Error;

use crate::core::output::BackendError;
use crate::core::task::TaskId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Graph integrity error: {0}")]
    GraphIntegrity(#[from] GraphIntegrityError),

    #[error("Output backend error on {output}: {source}")]
    OutputBackend {
        output: String,
        #[source]
        source: BackendError,
    },

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

/// Structural problems found while walking a task graph.
///
/// These are fatal for the traversal that hit them and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphIntegrityError {
    #[error("cycle detected at task {task}")]
    Cycle { task: TaskId },

    #[error("task {0} not found in graph")]
    UnknownTask(TaskId),

    #[error("could not list dependencies of {task}: {reason}")]
    Dependencies { task: TaskId, reason: String },
}

impl Error {
    pub(crate) fn backend(output: impl Into<String>, source: BackendError) -> Self {
        Error::OutputBackend {
            output: output.into(),
            source,
        }
    }

    /// Whether this error came from an output backend rather than the graph.
    pub fn is_backend(&self) -> bool {
        matches!(self, Error::OutputBackend { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
