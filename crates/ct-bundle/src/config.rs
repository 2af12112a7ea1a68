//! Loader configuration.
//!
//! Hosts either build a [`LoaderConfig`] in code or embed it (as JSON, TOML, ...)
//! in their own configuration file; every field has a default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::manifest::MAX_SUPPORTED_VERSION;
use crate::{BundleError, Result};

/// Directory name created under the system temp dir for extractions.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "ct-bundle";

/// Default cap on the number of entries in one archive.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default cap on total uncompressed bytes (512 MiB).
pub const DEFAULT_MAX_UNCOMPRESSED_BYTES: u64 = 512 * 1024 * 1024;

/// Limits applied while expanding an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractLimits {
    /// Maximum number of entries (files and directories).
    pub max_entries: usize,
    /// Maximum total uncompressed size in bytes.
    pub max_uncompressed_bytes: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        ExtractLimits {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_uncompressed_bytes: DEFAULT_MAX_UNCOMPRESSED_BYTES,
        }
    }
}

/// Bundle loader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Process-wide root under which each load gets its own directory.
    pub scratch_root: PathBuf,
    /// Highest manifest version this loader fully understands.
    pub max_supported_version: f64,
    /// Keep extracted files on disk after the bundle is dropped.
    pub retain_workspace: bool,
    /// Archive expansion limits.
    pub limits: ExtractLimits,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            scratch_root: std::env::temp_dir().join(DEFAULT_SCRATCH_DIR_NAME),
            max_supported_version: MAX_SUPPORTED_VERSION,
            retain_workspace: false,
            limits: ExtractLimits::default(),
        }
    }
}

impl LoaderConfig {
    /// Set the scratch root directory.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    /// Set the highest supported manifest version.
    pub fn with_max_supported_version(mut self, version: f64) -> Self {
        self.max_supported_version = version;
        self
    }

    /// Keep (or remove) extracted files once the bundle is dropped.
    pub fn with_retain_workspace(mut self, retain: bool) -> Self {
        self.retain_workspace = retain;
        self
    }

    /// Set the archive expansion limits.
    pub fn with_limits(mut self, limits: ExtractLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Parse from JSON, filling unset fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LoaderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no load could succeed with.
    pub fn validate(&self) -> Result<()> {
        if !self.max_supported_version.is_finite() || self.max_supported_version <= 0.0 {
            return Err(BundleError::InvalidConfig(format!(
                "max_supported_version must be a positive number, got {}",
                self.max_supported_version
            )));
        }
        if self.limits.max_entries == 0 {
            return Err(BundleError::InvalidConfig(
                "limits.max_entries must be non-zero".to_string(),
            ));
        }
        if self.limits.max_uncompressed_bytes == 0 {
            return Err(BundleError::InvalidConfig(
                "limits.max_uncompressed_bytes must be non-zero".to_string(),
            ));
        }
        if self.scratch_root.as_os_str().is_empty() {
            return Err(BundleError::InvalidConfig(
                "scratch_root is empty".to_string(),
            ));
        }
        Ok(())
    }
}
