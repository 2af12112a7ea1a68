//! Archive expansion.
//!
//! Expands a ZIP archive into a destination directory, preserving relative
//! paths. Entries that would land outside the destination are rejected.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

use crate::config::ExtractLimits;
use crate::{BundleError, Result};

/// What an expansion wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Archive entries processed (files and directories).
    pub entries: usize,
    /// Regular files written.
    pub files: usize,
    /// Uncompressed bytes written.
    pub bytes: u64,
}

/// Expand the archive at `archive` into `dest`.
///
/// Fails with `ArchiveNotFound` before touching `dest` if the archive is
/// missing, and with `ArchiveCorrupt` for anything that goes wrong afterwards.
pub fn expand(archive: &Path, dest: &Path, limits: &ExtractLimits) -> Result<ExtractStats> {
    if !archive.is_file() {
        return Err(BundleError::ArchiveNotFound(archive.to_path_buf()));
    }

    let file = File::open(archive).map_err(|e| BundleError::archive_corrupt(archive, e))?;
    expand_reader(file, archive, dest, limits)
}

/// Expand an archive from any `Read + Seek` source.
///
/// `label` names the archive in errors.
pub fn expand_reader<R: Read + Seek>(
    reader: R,
    label: &Path,
    dest: &Path,
    limits: &ExtractLimits,
) -> Result<ExtractStats> {
    let corrupt = |reason: String| BundleError::archive_corrupt(label, reason);

    let mut archive = ZipArchive::new(reader).map_err(|e| corrupt(e.to_string()))?;

    if archive.len() > limits.max_entries {
        return Err(corrupt(format!(
            "{} entries exceeds limit of {}",
            archive.len(),
            limits.max_entries
        )));
    }

    std::fs::create_dir_all(dest).map_err(|e| corrupt(e.to_string()))?;

    let mut stats = ExtractStats::default();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| corrupt(e.to_string()))?;

        let relative = entry
            .enclosed_name()
            .ok_or_else(|| corrupt(format!("unsafe entry path '{}'", entry.name())))?;
        let target = dest.join(&relative);

        stats.entries += 1;

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| corrupt(e.to_string()))?;
            continue;
        }

        let remaining = limits.max_uncompressed_bytes.saturating_sub(stats.bytes);
        if entry.size() > remaining {
            return Err(corrupt(format!(
                "uncompressed size exceeds limit of {} bytes",
                limits.max_uncompressed_bytes
            )));
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| corrupt(e.to_string()))?;
        }

        let mut out = File::create(&target).map_err(|e| corrupt(e.to_string()))?;
        // Declared sizes can lie; cap the actual copy as well
        let written = std::io::copy(&mut (&mut entry).take(remaining.saturating_add(1)), &mut out)
            .map_err(|e| corrupt(format!("{}: {}", relative.display(), e)))?;
        if written > remaining {
            return Err(corrupt(format!(
                "uncompressed size exceeds limit of {} bytes",
                limits.max_uncompressed_bytes
            )));
        }

        stats.files += 1;
        stats.bytes += written;
    }

    debug!(
        archive = %label.display(),
        dest = %dest.display(),
        entries = stats.entries,
        files = stats.files,
        bytes = stats.bytes,
        "Archive expanded"
    );

    Ok(stats)
}
