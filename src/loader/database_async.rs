//! Async catalog loading
//!
//! Eagerly loads the four catalog files in parallel. The parsed
//! ReferenceData behind a RwLock is shared with the synchronous engine
//! once loading completes.

use crate::loader::database::ReferenceData;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Async wrapper that loads catalogs off the main thread
pub struct AsyncReferenceData {
    /// Base directory containing the catalog files
    data_dir: PathBuf,
    /// The loaded catalogs (shared, thread-safe)
    inner: Arc<RwLock<ReferenceData>>,
}

impl AsyncReferenceData {
    pub fn new(data_dir: PathBuf) -> Self {
        AsyncReferenceData {
            data_dir,
            inner: Arc::new(RwLock::new(ReferenceData::empty())),
        }
    }

    /// Load all four catalogs in parallel. Returns the elapsed time.
    ///
    /// Fails fast: any missing or malformed file aborts the load and the
    /// previous contents are kept.
    pub async fn eager_load(&self) -> Result<std::time::Duration> {
        let start = Instant::now();

        let read = |name: &str| {
            let path = self.data_dir.join(name);
            tokio::spawn(async move { tokio::fs::read_to_string(path).await })
        };
        let units_task = read("units.json");
        let terrains_task = read("terrains.json");
        let dragons_task = read("dragons.json");
        let spells_task = read("spells.json");

        let units = units_task.await??;
        let terrains = terrains_task.await??;
        let dragons = dragons_task.await??;
        let spells = spells_task.await??;

        let mut data = ReferenceData::empty();
        data.load_units(&units)?;
        data.load_terrains(&terrains)?;
        data.load_dragons(&dragons)?;
        data.load_spells(&spells)?;

        *self.inner.write().await = data;
        Ok(start.elapsed())
    }

    /// Take a snapshot of the loaded catalogs for synchronous use
    pub async fn snapshot(&self) -> ReferenceData {
        self.inner.read().await.clone()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
