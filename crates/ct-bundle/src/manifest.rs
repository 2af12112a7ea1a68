//! Archive manifest types and parsing.
//!
//! The manifest is the archive's top-level descriptor:
//! - Format version of the producer
//! - Relative root of the summary document
//! - Relative root of the patch files

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::{BundleError, Result};

/// Highest manifest version this crate fully understands.
pub const MAX_SUPPORTED_VERSION: f64 = 1.0;

/// Manifest file name within the archive.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Top-level archive descriptor.
///
/// Unknown fields written by newer producers are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Producer format version. Zero means unset.
    #[serde(default)]
    pub version: f64,

    /// Summary directory, relative to the extraction root.
    pub summary_root: PathBuf,

    /// Patch directory, relative to the extraction root.
    pub patches_root: PathBuf,
}

impl Manifest {
    /// Create a manifest with the current version.
    pub fn new(summary_root: impl Into<PathBuf>, patches_root: impl Into<PathBuf>) -> Self {
        Self {
            version: MAX_SUPPORTED_VERSION,
            summary_root: summary_root.into(),
            patches_root: patches_root.into(),
        }
    }

    /// Set the version.
    pub fn with_version(mut self, version: f64) -> Self {
        self.version = version;
        self
    }

    /// Whether this manifest's version is within `max_supported`.
    pub fn is_supported(&self, max_supported: f64) -> bool {
        self.version <= max_supported
    }

    /// Validate the manifest structure.
    ///
    /// An unset (zero), negative or non-finite version is corruption; a root that
    /// is absolute or climbs out of the extraction root is an invalid manifest.
    pub fn validate(&self) -> Result<()> {
        if !self.version.is_finite() || self.version <= 0.0 {
            return Err(BundleError::ManifestCorrupt(format!(
                "version is unset or invalid: {}",
                self.version
            )));
        }

        for (field, root) in [
            ("summaryRoot", &self.summary_root),
            ("patchesRoot", &self.patches_root),
        ] {
            if !is_contained_relative(root) {
                return Err(BundleError::InvalidManifest(format!(
                    "{} '{}' must be a relative path inside the archive",
                    field,
                    root.display()
                )));
            }
        }

        Ok(())
    }

    /// Serialize to JSON with consistent formatting.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)
            .map_err(|e| BundleError::ManifestCorrupt(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }
}

/// True when `path` is relative and never leaves the directory it is joined to.
///
/// `""` and `"."` are accepted and refer to the directory itself.
pub(crate) fn is_contained_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
