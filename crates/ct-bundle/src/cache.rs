//! Loaded-bundle cache with explicit invalidation.
//!
//! Bundles are keyed by archive path. A cached bundle is reused only while the
//! archive on disk still has the same SHA-256; a re-downloaded archive is
//! loaded again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::loader::{checksum_file, BundleLoader};
use crate::{Bundle, BundleError, Result};

/// Thread-safe map of archive path to loaded bundle.
#[derive(Debug, Default)]
pub struct BundleCache {
    entries: Mutex<HashMap<PathBuf, Arc<Bundle>>>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Bundle>>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the cached bundle for `archive`, loading it on a miss or when the
    /// archive changed since it was cached.
    ///
    /// The lock is not held while loading; two threads missing on the same
    /// archive both load it and the last one wins.
    pub fn get_or_load(&self, loader: &BundleLoader, archive: &Path) -> Result<Arc<Bundle>> {
        if !archive.is_file() {
            self.invalidate(archive);
            return Err(BundleError::ArchiveNotFound(archive.to_path_buf()));
        }

        let checksum =
            checksum_file(archive).map_err(|e| BundleError::archive_corrupt(archive, e))?;
        if let Some(bundle) = self.lock().get(archive) {
            if bundle.archive_sha256() == checksum {
                debug!(archive = %archive.display(), "Bundle cache hit");
                return Ok(Arc::clone(bundle));
            }
            debug!(archive = %archive.display(), "Archive changed, reloading");
        }

        let bundle = Arc::new(loader.load(archive)?);
        self.lock()
            .insert(archive.to_path_buf(), Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Cached bundle for `archive`, without touching the filesystem.
    pub fn get(&self, archive: &Path) -> Option<Arc<Bundle>> {
        self.lock().get(archive).cloned()
    }

    /// Drop the cached bundle for `archive`. Returns whether one was cached.
    ///
    /// The extracted files go away once the last `Arc` to the bundle is dropped.
    pub fn invalidate(&self, archive: &Path) -> bool {
        let removed = self.lock().remove(archive).is_some();
        if removed {
            debug!(archive = %archive.display(), "Bundle cache entry invalidated");
        }
        removed
    }

    /// Drop every cached bundle.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
