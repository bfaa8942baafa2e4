//! On-disk forecast cache, one JSON file per category group

use crate::error::{Result, ServiceError};
use crate::source::CategoryGroup;
use forecast_core::CategoryForecast;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Accepted layouts of a cache file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CacheDocument {
    Bare(Vec<CategoryForecast>),
    Wrapped { forecasts: Vec<CategoryForecast> },
}

impl CacheDocument {
    fn into_forecasts(self) -> Vec<CategoryForecast> {
        match self {
            CacheDocument::Bare(forecasts) => forecasts,
            CacheDocument::Wrapped { forecasts } => forecasts,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForecastCache {
    dir: PathBuf,
}

impl ForecastCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, group: CategoryGroup) -> PathBuf {
        self.dir.join(group.cache_file())
    }

    /// Replace a group's cache file in one step.
    ///
    /// The records are written to a temporary file next to the target and
    /// renamed over it, so readers never observe a partial file.
    pub fn store(&self, group: CategoryGroup, forecasts: &[CategoryForecast]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(group);

        let mut file = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut file, forecasts)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|err| ServiceError::Io(err.error))?;

        debug!(%group, records = forecasts.len(), path = %path.display(), "cache stored");
        Ok(path)
    }

    /// Read a group's cached records
    pub fn load(&self, group: CategoryGroup) -> Result<Vec<CategoryForecast>> {
        let text = fs::read_to_string(self.path(group))?;
        let document: CacheDocument = serde_json::from_str(&text)?;
        Ok(document.into_forecasts())
    }

    /// True when the file exists and holds forecast records that [`load`](Self::load) accepts
    pub fn is_usable(&self, group: CategoryGroup) -> bool {
        match fs::read_to_string(self.path(group)) {
            Ok(text) if !text.trim().is_empty() => {
                serde_json::from_str::<CacheDocument>(&text).is_ok()
            }
            _ => false,
        }
    }

    /// Load a group, running `regenerate` first if its file is unusable
    pub fn load_or_regenerate<F>(&self, group: CategoryGroup, regenerate: F) -> Result<Vec<CategoryForecast>>
    where
        F: FnOnce() -> Result<()>,
    {
        if !self.is_usable(group) {
            info!(%group, path = %self.path(group).display(), "cache missing or invalid, regenerating");
            regenerate()?;
        }
        self.load(group)
    }

    /// Look up one cached record by category name and horizon
    pub fn find(&self, group: CategoryGroup, name: &str, semesters: usize) -> Result<CategoryForecast> {
        self.load(group)?
            .into_iter()
            .find(|forecast| forecast.name == name && forecast.horizon == semesters)
            .ok_or_else(|| ServiceError::NotFound {
                group,
                name: name.to_string(),
                semesters,
            })
    }
}
