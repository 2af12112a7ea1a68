//! Shared helpers for ct-bundle integration tests.

#![allow(dead_code)]

use ct_bundle::{BundleLoader, LoaderConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use zip::write::{SimpleFileOptions, ZipWriter};

static LOGGING: Once = Once::new();

/// Route `tracing` output to the test harness (RUST_LOG controls the level).
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ct_bundle=debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Temp directory plus a loader whose scratch root lives inside it.
pub struct Harness {
    pub dir: TempDir,
    pub loader: BundleLoader,
}

impl Harness {
    pub fn new() -> Self {
        init_test_logging();
        let dir = TempDir::new().expect("tempdir");
        let loader = BundleLoader::new(
            LoaderConfig::default().with_scratch_root(dir.path().join("scratch")),
        )
        .expect("loader");
        Self { dir, loader }
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    /// Number of per-load workspaces currently on disk.
    pub fn workspace_count(&self) -> usize {
        std::fs::read_dir(self.scratch_root())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Write a raw ZIP with exactly `entries` and return its path.
    pub fn raw_archive(&self, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = self.dir.path().join(name);
        write_raw_zip(&path, entries);
        path
    }
}

/// Write a ZIP with exactly `entries`; names ending in `/` become directories.
pub fn write_raw_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create zip");
    let mut zip = ZipWriter::new(file);
    for (name, data) in entries {
        if let Some(dir) = name.strip_suffix('/') {
            zip.add_directory(dir, SimpleFileOptions::default())
                .expect("add directory");
        } else {
            zip.start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            zip.write_all(data).expect("write entry");
        }
    }
    zip.finish().expect("finish zip");
}

pub const MANIFEST_V1: &[u8] = br#"{"version": 1.0, "summaryRoot": "sum", "patchesRoot": "patch"}"#;
