//! The validated, immutable result of loading an archive.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::description::DescriptionContent;
use crate::manifest::Manifest;
use crate::summary::Summary;
use crate::workspace::Workspace;
use crate::Result;

/// Fixed patch file name of the legacy single-patch layout.
pub const LEGACY_PATCH_FILE_NAME: &str = "diff.patch";

/// One patch file, read into memory at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFile {
    /// Name relative to the patches root.
    pub filename: String,
    /// Location in the extracted tree.
    ///
    /// Only valid while the owning [`Bundle`] is alive; its workspace is
    /// removed on drop, clones of this struct included. Use `contents` after that.
    pub path: PathBuf,
    /// Raw patch bytes.
    pub contents: Vec<u8>,
    /// SHA-256 of `contents` (64 hex characters).
    pub sha256: String,
}

impl PatchFile {
    /// Read `path` and checksum it.
    pub fn read(filename: impl Into<String>, path: &Path) -> Result<Self> {
        let contents = std::fs::read(path)?;
        let sha256 = compute_checksum(&contents);
        Ok(Self {
            filename: filename.into(),
            path: path.to_path_buf(),
            contents,
            sha256,
        })
    }

    /// The patch as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Compute the SHA-256 checksum of data as lowercase hex.
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Which archive layout produced the patches.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchSet {
    /// No description file: exactly one `diff.patch`.
    LegacySinglePatch(PatchFile),

    /// A description file lists the patches in application order.
    DescribedMultiPatch {
        /// Where the description was read from.
        description_path: PathBuf,
        description: DescriptionContent,
        /// Same length and order as `description.content`.
        patches: Vec<PatchFile>,
    },
}

impl PatchSet {
    /// Patches in application order. Never empty.
    pub fn patches(&self) -> &[PatchFile] {
        match self {
            PatchSet::LegacySinglePatch(patch) => std::slice::from_ref(patch),
            PatchSet::DescribedMultiPatch { patches, .. } => patches,
        }
    }

    pub fn description(&self) -> Option<&DescriptionContent> {
        match self {
            PatchSet::LegacySinglePatch(_) => None,
            PatchSet::DescribedMultiPatch { description, .. } => Some(description),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, PatchSet::LegacySinglePatch(_))
    }

    /// Short name of the layout, for logs.
    pub fn mode(&self) -> &'static str {
        match self {
            PatchSet::LegacySinglePatch(_) => "legacy_single_patch",
            PatchSet::DescribedMultiPatch { .. } => "described_multi_patch",
        }
    }
}

/// A non-fatal condition noticed while loading.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    /// The manifest is newer than this loader; loaded on a best-effort basis.
    UnsupportedVersion { found: f64, supported: f64 },

    /// Several manifest files were found; `chosen` was used.
    AmbiguousManifest {
        chosen: PathBuf,
        candidates: Vec<PathBuf>,
    },

    /// Several description files were found; `chosen` was used.
    AmbiguousDescription {
        chosen: PathBuf,
        candidates: Vec<PathBuf>,
    },
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadWarning::UnsupportedVersion { found, supported } => write!(
                f,
                "manifest version {} is newer than supported version {}",
                found, supported
            ),
            LoadWarning::AmbiguousManifest { chosen, candidates } => write!(
                f,
                "{} manifest files found, using '{}'",
                candidates.len(),
                chosen.display()
            ),
            LoadWarning::AmbiguousDescription { chosen, candidates } => write!(
                f,
                "{} description files found, using '{}'",
                candidates.len(),
                chosen.display()
            ),
        }
    }
}

/// A fully validated transformation result.
///
/// Patch and summary contents are held in memory; the extracted tree stays on
/// disk until the bundle is dropped.
#[derive(Debug)]
pub struct Bundle {
    source: PathBuf,
    archive_sha256: String,
    manifest: Manifest,
    patches: PatchSet,
    summary: Summary,
    summary_path: PathBuf,
    warnings: Vec<LoadWarning>,
    loaded_at: DateTime<Utc>,
    workspace: Workspace,
}

/// Parts of a bundle gathered by the loader.
#[derive(Debug)]
pub(crate) struct BundleParts {
    pub source: PathBuf,
    pub archive_sha256: String,
    pub manifest: Manifest,
    pub patches: PatchSet,
    pub summary: Summary,
    pub summary_path: PathBuf,
    pub warnings: Vec<LoadWarning>,
    pub workspace: Workspace,
}

impl Bundle {
    pub(crate) fn assemble(parts: BundleParts) -> Self {
        debug_assert!(!parts.patches.patches().is_empty());
        debug_assert!(parts
            .patches
            .description()
            .map(|d| d.len() == parts.patches.patches().len())
            .unwrap_or(true));

        Self {
            source: parts.source,
            archive_sha256: parts.archive_sha256,
            manifest: parts.manifest,
            patches: parts.patches,
            summary: parts.summary,
            summary_path: parts.summary_path,
            warnings: parts.warnings,
            loaded_at: Utc::now(),
            workspace: parts.workspace,
        }
    }

    /// Archive path the bundle was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// SHA-256 of the archive bytes.
    pub fn archive_sha256(&self) -> &str {
        &self.archive_sha256
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn patch_set(&self) -> &PatchSet {
        &self.patches
    }

    /// Patches in application order. Never empty.
    pub fn patches(&self) -> &[PatchFile] {
        self.patches.patches()
    }

    /// Patch metadata, present only for multi-patch archives.
    pub fn description(&self) -> Option<&DescriptionContent> {
        self.patches.description()
    }

    pub fn is_legacy(&self) -> bool {
        self.patches.is_legacy()
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Root of this bundle's extracted tree.
    pub fn extraction_root(&self) -> &Path {
        self.workspace.path()
    }
}
