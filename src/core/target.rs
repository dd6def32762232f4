//! Concrete output backends.
//!
//! `LocalTarget` maps an output to a path on the local filesystem.
//! `MemoryTarget` keeps the artifact state in memory and counts removals,
//! which makes it handy for dry runs and tests.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::core::output::{BackendError, Output};

/// A file or directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalTarget {
    path: PathBuf,
    protected: bool,
}

impl LocalTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            protected: false,
        }
    }

    /// Mark the target as protected so invalidation leaves it alone.
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Output for LocalTarget {
    fn exists(&self) -> Result<bool, BackendError> {
        Ok(self.path.try_exists()?)
    }

    fn remove(&self) -> Result<(), BackendError> {
        let result = if self.path.is_dir() {
            std::fs::remove_dir_all(&self.path)
        } else {
            std::fs::remove_file(&self.path)
        };

        match result {
            Ok(()) => Ok(()),
            // Someone else got there first.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Box::new(e)),
        }
    }

    fn is_protected(&self) -> bool {
        self.protected
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An artifact whose existence is tracked in memory.
#[derive(Debug)]
pub struct MemoryTarget {
    name: String,
    exists: AtomicBool,
    protected: bool,
    removals: AtomicUsize,
}

impl MemoryTarget {
    /// Create an existing, unprotected artifact.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            exists: AtomicBool::new(true),
            protected: false,
            removals: AtomicUsize::new(0),
        }
    }

    /// Create an artifact that has not been produced yet.
    pub fn missing(name: &str) -> Self {
        let target = Self::new(name);
        target.exists.store(false, Ordering::SeqCst);
        target
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mark the artifact as produced again.
    pub fn restore(&self) {
        self.exists.store(true, Ordering::SeqCst);
    }

    /// Number of `remove` calls that actually deleted the artifact.
    pub fn removals(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }

    pub fn is_present(&self) -> bool {
        self.exists.load(Ordering::SeqCst)
    }
}

impl Output for MemoryTarget {
    fn exists(&self) -> Result<bool, BackendError> {
        Ok(self.is_present())
    }

    fn remove(&self) -> Result<(), BackendError> {
        if self.exists.swap(false, Ordering::SeqCst) {
            self.removals.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_protected(&self) -> bool {
        self.protected
    }

    fn describe(&self) -> String {
        format!("memory://{}", self.name)
    }
}
