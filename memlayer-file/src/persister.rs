//! Whole-collection JSON file persistence.
//!
//! [`JsonFilePersister`] implements both [`Loader`] and [`Saver`] by reading and
//! writing the entire record list as one JSON array in a single file.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    ffi::OsString,
    fmt,
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, trace};

use memlayer_core::{
    backend::{Loader, Saver},
    error::{StoreError, StoreResult},
    lifecycle::Configurable,
};

use crate::config::JsonFilePersisterConfig;

/// Loads and saves a record list as a JSON array in a single file.
///
/// A missing file loads as an empty list, so a fresh path bootstraps cleanly on first
/// open. Saves write a temporary sibling file and rename it over the target, so a
/// reader never sees a partially written file.
///
/// # Example
///
/// ```ignore
/// use memlayer::file::JsonFilePersister;
/// use memlayer::backend::{Loader, Saver};
///
/// let persister = JsonFilePersister::<Note>::new("./data/notes.json");
///
/// persister.save(&notes).await?;
/// let loaded = persister.load().await?;
/// ```
pub struct JsonFilePersister<T> {
    path: Option<PathBuf>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFilePersister<T> {
    /// Creates a persister bound to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            _marker: PhantomData,
        }
    }

    /// Creates a persister with no path. It must be configured before use.
    pub fn unconfigured() -> Self {
        Self {
            path: None,
            _marker: PhantomData,
        }
    }

    /// Returns the configured file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn required_path(&self) -> StoreResult<&Path> {
        self.path()
            .ok_or_else(|| StoreError::Configuration("Data file path is not set".into()))
    }
}

impl<T> fmt::Debug for JsonFilePersister<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFilePersister")
            .field("path", &self.path)
            .finish()
    }
}

impl<T> Default for JsonFilePersister<T> {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl<T> Configurable for JsonFilePersister<T> {
    type Config = JsonFilePersisterConfig;

    fn configure(&mut self, config: &JsonFilePersisterConfig) {
        self.path = config.path.clone();
    }
}

#[async_trait]
impl<T> Loader<T> for JsonFilePersister<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn load(&self) -> StoreResult<Vec<T>> {
        let path = self.required_path()?;

        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Data file doesn't exist, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::read(path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let items: Vec<T> = serde_json::from_slice(&bytes).map_err(|e| StoreError::read(path, e))?;

        trace!(path = %path.display(), count = items.len(), "Read items from file");

        Ok(items)
    }
}

#[async_trait]
impl<T> Saver<T> for JsonFilePersister<T>
where
    T: Serialize + Send + Sync + 'static,
{
    async fn save(&self, items: &[T]) -> StoreResult<()> {
        let path = self.required_path()?;
        let json = serde_json::to_vec_pretty(items).map_err(|e| StoreError::write(path, e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::write(path, e))?;
        }

        let tmp_path = temporary_path(path);

        fs::write(&tmp_path, json)
            .await
            .map_err(|e| StoreError::write(path, e))?;

        fs::rename(&tmp_path, path)
            .await
            .map_err(|e| StoreError::write(path, e))?;

        trace!(path = %path.display(), count = items.len(), "Wrote items to file");

        Ok(())
    }
}

/// `data.json` -> `data.json.tmp`
fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(OsString::from(".tmp"));

    PathBuf::from(name)
}
