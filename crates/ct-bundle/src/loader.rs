//! Bundle loader: archive in, validated [`Bundle`] out.
//!
//! Load sequence:
//! 1. Check the archive exists
//! 2. Expand it into a fresh per-load workspace
//! 3. Locate and parse `manifest.json`, check its version
//! 4. Resolve the summary and patch roots
//! 5. Pick the layout: a `*.json` description in the patch root means
//!    multi-patch, otherwise a single `diff.patch`
//! 6. Read patches and `summary.md` into memory and assemble the bundle
//!
//! Every step fails fast with its own error; the workspace of a failed load is
//! removed (unless the config retains workspaces).

use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::bundle::{BundleParts, LoadWarning, PatchFile, PatchSet, LEGACY_PATCH_FILE_NAME};
use crate::config::LoaderConfig;
use crate::description::DescriptionContent;
use crate::extract;
use crate::manifest::{Manifest, MANIFEST_FILE_NAME};
use crate::summary::{Summary, SUMMARY_FILE_NAME};
use crate::workspace::Workspace;
use crate::{Bundle, BundleError, Result};

/// Loads result archives according to a [`LoaderConfig`].
#[derive(Debug, Clone, Default)]
pub struct BundleLoader {
    config: LoaderConfig,
}

impl BundleLoader {
    /// Create a loader, rejecting an unusable config.
    pub fn new(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load and validate the archive at `archive`.
    ///
    /// Blocking: expands the archive and reads every patch and the summary.
    pub fn load(&self, archive: &Path) -> Result<Bundle> {
        if !archive.is_file() {
            return Err(BundleError::ArchiveNotFound(archive.to_path_buf()));
        }

        let archive_sha256 =
            checksum_file(archive).map_err(|e| BundleError::archive_corrupt(archive, e))?;
        let workspace = Workspace::create(&self.config.scratch_root, self.config.retain_workspace)?;
        let root = workspace.path().to_path_buf();

        extract::expand(archive, &root, &self.config.limits)?;

        let mut warnings = Vec::new();

        let manifest_path = find_manifest(archive, &root, &mut warnings)?;
        let manifest = read_manifest(&manifest_path)?;

        if !manifest.is_supported(self.config.max_supported_version) {
            push_warning(
                &mut warnings,
                LoadWarning::UnsupportedVersion {
                    found: manifest.version,
                    supported: self.config.max_supported_version,
                },
            );
        }

        let summary_dir = resolve_root(&root, &manifest.summary_root, "summaryRoot")?;
        let patches_dir = resolve_root(&root, &manifest.patches_root, "patchesRoot")?;

        let patches = match find_description(&patches_dir, &manifest_path, &mut warnings)? {
            None => read_legacy_patch(&patches_dir)?,
            Some(description_path) => read_described_patches(&patches_dir, description_path)?,
        };

        let summary_path = summary_dir.join(SUMMARY_FILE_NAME);
        let summary = Summary::read(&summary_path)?;

        info!(
            archive = %archive.display(),
            version = manifest.version,
            mode = patches.mode(),
            patches = patches.patches().len(),
            warnings = warnings.len(),
            "Bundle loaded"
        );

        Ok(Bundle::assemble(BundleParts {
            source: archive.to_path_buf(),
            archive_sha256,
            manifest,
            patches,
            summary,
            summary_path,
            warnings,
            workspace,
        }))
    }
}

/// Load `archive` with the default configuration.
pub fn load(archive: impl AsRef<Path>) -> Result<Bundle> {
    BundleLoader::default().load(archive.as_ref())
}

/// SHA-256 of a file, streamed.
pub(crate) fn checksum_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn push_warning(warnings: &mut Vec<LoadWarning>, warning: LoadWarning) {
    warn!(warning = %warning, "Bundle load warning");
    warnings.push(warning);
}

/// Find `manifest.json` anywhere in the extracted tree.
///
/// With several candidates the shallowest wins, ties broken by path, so the
/// choice never depends on directory listing order.
fn find_manifest(archive: &Path, root: &Path, warnings: &mut Vec<LoadWarning>) -> Result<PathBuf> {
    let mut candidates: Vec<(usize, PathBuf)> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST_FILE_NAME)
        .map(|e| (e.depth(), e.into_path()))
        .collect();

    candidates.sort();

    let mut candidates = candidates.into_iter().map(|(_, path)| path);
    let chosen = candidates
        .next()
        .ok_or_else(|| BundleError::ManifestNotFound(archive.to_path_buf()))?;

    let others: Vec<PathBuf> = candidates.collect();
    if !others.is_empty() {
        let mut all = vec![chosen.clone()];
        all.extend(others);
        push_warning(
            warnings,
            LoadWarning::AmbiguousManifest {
                chosen: chosen.clone(),
                candidates: all,
            },
        );
    }

    debug!(manifest = %chosen.display(), "Manifest located");
    Ok(chosen)
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| BundleError::ManifestCorrupt(format!("{}: {}", path.display(), e)))?;
    Manifest::from_json(&json)
}

/// Resolve a manifest root against the extraction root; it must be a directory.
fn resolve_root(root: &Path, relative: &Path, field: &str) -> Result<PathBuf> {
    let dir = root.join(relative);
    if !dir.is_dir() {
        return Err(BundleError::InvalidManifest(format!(
            "{} '{}' is not a directory in the archive",
            field,
            relative.display()
        )));
    }
    Ok(dir)
}

/// Look for a `*.json` description directly inside the patch root.
///
/// The manifest itself is never a candidate, even when it shares the directory.
fn find_description(
    patches_dir: &Path,
    manifest_path: &Path,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Option<PathBuf>> {
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(patches_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
        if is_json && entry.file_type()?.is_file() && path != manifest_path {
            candidates.push(path);
        }
    }

    candidates.sort();

    let Some(chosen) = candidates.first().cloned() else {
        return Ok(None);
    };

    if candidates.len() > 1 {
        push_warning(
            warnings,
            LoadWarning::AmbiguousDescription {
                chosen: chosen.clone(),
                candidates,
            },
        );
    }

    Ok(Some(chosen))
}

/// Resolve `filename` under the patch root; it must be a regular file.
fn resolve_patch(patches_dir: &Path, filename: &str) -> Result<PathBuf> {
    let path = patches_dir.join(filename);
    if !path.is_file() {
        return Err(BundleError::PatchNotFound(filename.to_string()));
    }
    Ok(path)
}

fn read_legacy_patch(patches_dir: &Path) -> Result<PatchSet> {
    let path = resolve_patch(patches_dir, LEGACY_PATCH_FILE_NAME)?;
    debug!(patch = %path.display(), "Legacy single-patch layout");
    Ok(PatchSet::LegacySinglePatch(PatchFile::read(
        LEGACY_PATCH_FILE_NAME,
        &path,
    )?))
}

fn read_described_patches(patches_dir: &Path, description_path: PathBuf) -> Result<PatchSet> {
    let json = std::fs::read_to_string(&description_path).map_err(|e| {
        BundleError::DescriptionCorrupt {
            path: description_path.clone(),
            reason: e.to_string(),
        }
    })?;
    let description = DescriptionContent::from_json(&json, &description_path)?;

    // Resolve every file before reading any, so a missing one fails cheaply
    let paths = description
        .filenames()
        .map(|filename| resolve_patch(patches_dir, filename))
        .collect::<Result<Vec<_>>>()?;

    let patches = description
        .filenames()
        .zip(&paths)
        .map(|(filename, path)| PatchFile::read(filename, path))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        description = %description_path.display(),
        patches = patches.len(),
        "Described multi-patch layout"
    );

    Ok(PatchSet::DescribedMultiPatch {
        description_path,
        description,
        patches,
    })
}
