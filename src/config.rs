use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::task::TaskNode;
use crate::invalidation::{BoundaryFamilies, ConcurrentOptions, InvalidationRequest, Invalidator};
use crate::{dklog_debug, Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Default boundary families for requests built from this config.
    pub boundary_families: Option<Vec<String>>,
    /// Worker threads for concurrent invalidation.
    pub workers: Option<usize>,
    /// Families whose tasks are traversed but never invalidated.
    #[serde(default)]
    pub protected_families: Vec<String>,
}

impl Config {
    pub fn donkeykong_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or(Error::NoHomeDir)?
            .join(".donkeykong"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::donkeykong_dir()?.join("config.toml"))
    }

    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or(1)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        dklog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            dklog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        dklog_debug!(
            "Config loaded: boundary_families={:?}, workers={:?}, protected_families={:?}",
            config.boundary_families,
            config.workers,
            config.protected_families
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                dklog_debug!("Creating config directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        dklog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// The configured boundary set. An empty list is rejected rather than
    /// read as "no filter".
    pub fn boundary(&self) -> Result<Option<BoundaryFamilies>> {
        self.boundary_families
            .as_ref()
            .map(|families| BoundaryFamilies::new(families.iter().cloned()))
            .transpose()
    }

    pub fn request<T: TaskNode>(
        &self,
        end_tasks: impl IntoIterator<Item = T>,
    ) -> Result<InvalidationRequest<T>> {
        Ok(InvalidationRequest::new(end_tasks).with_boundary(self.boundary()?))
    }

    pub fn invalidator(&self) -> Invalidator {
        Invalidator::new().protect_families(self.protected_families.iter().cloned())
    }

    pub fn concurrency(&self) -> ConcurrentOptions {
        ConcurrentOptions::new(self.effective_workers())
    }
}
