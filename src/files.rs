//! Local JSON persistence for the catalog, the record store and the staged entries.

use crate::error::Res;
use crate::utils;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Holds the `path` of a JSON file together with its deserialized `data`, so the data can be
/// changed in memory and written back with `save`.
#[derive(Default, Debug, Clone)]
pub(crate) struct JsonFile<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    path: PathBuf,
    data: F,
}

impl<F> JsonFile<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    /// Loads `path`, or uses `default()` when there is no file yet. A file that exists but cannot
    /// be parsed is an error, never silently replaced.
    pub(crate) async fn load_or_else(
        path: impl Into<PathBuf>,
        default: impl FnOnce() -> F,
    ) -> Res<Self> {
        let path = path.into();
        let data = if utils::exists(&path).await? {
            trace!("Loading {}", path.display());
            utils::deserialize(&path).await?
        } else {
            debug!("{} does not exist, starting from the default", path.display());
            default()
        };
        Ok(Self { path, data })
    }

    #[cfg(test)]
    pub(crate) fn new(path: impl Into<PathBuf>, data: F) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Writes the current data to the file. On failure the in-memory data is untouched, so the
    /// save can be retried.
    pub(crate) async fn save(&self) -> Res<()> {
        utils::serialize(&self.path, &self.data).await
    }

    pub(crate) fn data(&self) -> &F {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}
