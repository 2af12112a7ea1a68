//! Bundle writer for producing transformation result archives.
//!
//! Lays files out the way the loader expects them:
//! - `manifest.json` at the archive root
//! - `<summaryRoot>/summary.md`
//! - `<patchesRoot>/diff.patch` (legacy) or the described patches plus
//!   `<patchesRoot>/description.json`

use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::bundle::LEGACY_PATCH_FILE_NAME;
use crate::description::{DescriptionContent, PatchInfo};
use crate::manifest::{Manifest, MANIFEST_FILE_NAME};
use crate::summary::SUMMARY_FILE_NAME;
use crate::{BundleError, Result};

/// File name the writer gives the patch description.
pub const DESCRIPTION_FILE_NAME: &str = "description.json";

/// Default roots used by the writer.
pub const DEFAULT_SUMMARY_ROOT: &str = "summary";
pub const DEFAULT_PATCHES_ROOT: &str = "patch";

/// Builder for transformation result archives.
pub struct BundleWriter {
    manifest: Manifest,
    summary: Option<String>,
    legacy_patch: Option<Vec<u8>>,
    described: Vec<(PatchInfo, Vec<u8>)>,
    files: Vec<(String, Vec<u8>)>,
}

impl Default for BundleWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleWriter {
    /// Create a writer with the current version and default roots.
    pub fn new() -> Self {
        Self {
            manifest: Manifest::new(DEFAULT_SUMMARY_ROOT, DEFAULT_PATCHES_ROOT),
            summary: None,
            legacy_patch: None,
            described: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Set the manifest version.
    pub fn with_version(mut self, version: f64) -> Self {
        self.manifest = self.manifest.with_version(version);
        self
    }

    /// Set the summary and patch roots.
    pub fn with_roots(
        mut self,
        summary_root: impl Into<PathBuf>,
        patches_root: impl Into<PathBuf>,
    ) -> Self {
        self.manifest.summary_root = summary_root.into();
        self.manifest.patches_root = patches_root.into();
        self
    }

    /// Set the summary text.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the single `diff.patch` of the legacy layout.
    pub fn add_legacy_patch(&mut self, data: Vec<u8>) {
        debug!(bytes = data.len(), "Added legacy patch");
        self.legacy_patch = Some(data);
    }

    /// Append a described patch; order of calls is application order.
    pub fn add_patch(&mut self, info: PatchInfo, data: Vec<u8>) {
        debug!(filename = %info.filename, bytes = data.len(), "Added described patch");
        self.described.push((info, data));
    }

    /// Add a raw entry at `path` inside the archive.
    pub fn add_file(&mut self, path: impl Into<String>, data: Vec<u8>) {
        let path = path.into();
        debug!(path = %path, bytes = data.len(), "Added raw file");
        self.files.push((path, data));
    }

    /// The manifest that will be written.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Number of patches (legacy or described).
    pub fn patch_count(&self) -> usize {
        self.described.len() + usize::from(self.legacy_patch.is_some())
    }

    /// Every entry except the manifest, in archive order.
    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        if self.patch_count() == 0 && self.files.is_empty() {
            return Err(BundleError::EmptyBundle);
        }

        let summary_root = &self.manifest.summary_root;
        let patches_root = &self.manifest.patches_root;
        let mut entries = Vec::new();

        if let Some(summary) = &self.summary {
            entries.push((
                archive_path(summary_root, SUMMARY_FILE_NAME),
                summary.clone().into_bytes(),
            ));
        }

        if let Some(data) = &self.legacy_patch {
            entries.push((archive_path(patches_root, LEGACY_PATCH_FILE_NAME), data.clone()));
        }

        if !self.described.is_empty() {
            let description = DescriptionContent::new(
                self.described.iter().map(|(info, _)| info.clone()).collect(),
            );
            entries.push((
                archive_path(patches_root, DESCRIPTION_FILE_NAME),
                description.to_json()?.into_bytes(),
            ));
            for (info, data) in &self.described {
                entries.push((archive_path(patches_root, &info.filename), data.clone()));
            }
        }

        entries.extend(self.files.iter().cloned());
        Ok(entries)
    }

    fn write_zip<W: Write + Seek>(&self, sink: W) -> Result<usize> {
        let entries = self.entries()?;

        let mut zip = ZipWriter::new(sink);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        // Write manifest first
        zip.start_file(MANIFEST_FILE_NAME, options)?;
        zip.write_all(self.manifest.to_json()?.as_bytes())?;

        for (path, data) in &entries {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(data)?;
        }

        zip.finish()?;
        Ok(entries.len() + 1)
    }

    /// Write the archive to a file.
    pub fn write(self, path: &Path) -> Result<Manifest> {
        let file = File::create(path)?;
        let entries = self.write_zip(file)?;

        info!(
            path = %path.display(),
            entries,
            patches = self.patch_count(),
            "Bundle written"
        );

        Ok(self.manifest)
    }

    /// Write the archive to a byte vector (for in-memory use).
    pub fn write_to_vec(self) -> Result<(Vec<u8>, Manifest)> {
        let mut buffer = Cursor::new(Vec::new());
        let entries = self.write_zip(&mut buffer)?;
        let bytes = buffer.into_inner();

        info!(
            entries,
            compressed_bytes = bytes.len(),
            patches = self.patch_count(),
            "Bundle written to memory"
        );

        Ok((bytes, self.manifest))
    }
}

/// Join a manifest root and a file name into a `/`-separated entry name.
fn archive_path(root: &Path, name: &str) -> String {
    let mut parts: Vec<String> = root
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.push(name.to_string());
    parts.join("/")
}
