//! Per-load extraction directory.
//!
//! All loads share one scratch root, but each load expands into its own
//! `load-<uuid>` subdirectory so concurrent loads never see each other's files.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::Result;

/// Prefix of every per-load directory under the scratch root.
pub const WORKSPACE_PREFIX: &str = "load-";

/// An isolated extraction directory owned by one load.
///
/// Removed on drop unless retained.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    retain: bool,
}

impl Workspace {
    /// Create a fresh, empty directory under `scratch_root`.
    pub fn create(scratch_root: &Path, retain: bool) -> Result<Self> {
        std::fs::create_dir_all(scratch_root)?;

        let name = format!("{}{}", WORKSPACE_PREFIX, uuid::Uuid::new_v4().simple());
        let path = scratch_root.join(name);
        // create_dir (not create_dir_all) so a name collision is an error, not a share
        std::fs::create_dir(&path)?;

        debug!(path = %path.display(), retain, "Workspace created");

        Ok(Self { path, retain })
    }

    /// Root of the extracted tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory survives drop.
    pub fn is_retained(&self) -> bool {
        self.retain
    }

    /// Keep the directory on disk after drop.
    pub fn retain(&mut self) {
        self.retain = true;
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.retain {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Workspace removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove workspace"),
        }
    }
}
