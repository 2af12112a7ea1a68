//! No-mock loader integration tests.
//!
//! Every test builds a real ZIP on disk and loads it through the public API:
//! - Legacy single-patch and described multi-patch layouts
//! - One test per error kind
//! - Forward-compatible (newer) manifest versions
//! - Workspace lifecycle

mod common;

use common::{write_raw_zip, Harness, MANIFEST_V1};
use ct_bundle::{
    BundleError, BundleWriter, ErrorKind, LoadWarning, PatchInfo, MAX_SUPPORTED_VERSION,
};
use serde_json::json;

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_a_legacy_single_patch() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "a.zip",
        &[
            ("manifest.json", MANIFEST_V1),
            ("patch/diff.patch", b"--- a/App.java\n+++ b/App.java\n"),
            ("sum/summary.md", b"Changed 3 files."),
        ],
    );

    let bundle = h.loader.load(&archive).expect("load");

    assert_eq!(bundle.patches().len(), 1);
    assert!(bundle.description().is_none());
    assert!(bundle.is_legacy());
    assert_eq!(bundle.summary().text(), "Changed 3 files.");
    assert_eq!(bundle.manifest().version, 1.0);
    assert_eq!(bundle.source(), archive.as_path());
    assert!(bundle.warnings().is_empty());
}

#[test]
fn test_scenario_b_described_single_patch() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "b.zip",
        &[
            ("manifest.json", MANIFEST_V1),
            ("patch/diff.patch", b"--- a\n+++ b\n"),
            ("patch/desc.json", br#"{"content":[{"filename":"diff.patch"}]}"#),
            ("sum/summary.md", b"Changed 3 files."),
        ],
    );

    let bundle = h.loader.load(&archive).expect("load");

    let description = bundle.description().expect("description");
    assert_eq!(description.len(), 1);
    assert!(!bundle.is_legacy());
    assert!(bundle.patches()[0]
        .path
        .ends_with(std::path::Path::new("patch").join("diff.patch")));
    assert_eq!(bundle.patches()[0].contents, b"--- a\n+++ b\n");
}

#[test]
fn test_scenario_c_described_patch_missing() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "c.zip",
        &[
            ("manifest.json", MANIFEST_V1),
            ("patch/desc.json", br#"{"content":[{"filename":"missing.patch"}]}"#),
            ("sum/summary.md", b"Changed 3 files."),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");

    match err {
        BundleError::PatchNotFound(name) => assert_eq!(name, "missing.patch"),
        other => panic!("expected PatchNotFound, got {:?}", other),
    }
}

#[test]
fn test_scenario_d_no_manifest() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "d.zip",
        &[
            ("patch/diff.patch", b"x"),
            ("sum/summary.md", b"s"),
            ("not-a-manifest.txt", b"{}"),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::ManifestNotFound);
}

#[test]
fn test_scenario_e_summary_root_is_file() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "e.zip",
        &[
            ("manifest.json", MANIFEST_V1),
            ("patch/diff.patch", b"x"),
            ("sum", b"I am a file, not a directory"),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::InvalidManifest);
}

// ============================================================================
// Error kinds
// ============================================================================

#[test]
fn test_missing_archive_never_extracts() {
    let h = Harness::new();
    let err = h
        .loader
        .load(&h.dir.path().join("never-downloaded.zip"))
        .expect_err("should fail");

    assert_eq!(err.kind(), ErrorKind::ArchiveNotFound);
    assert_eq!(h.workspace_count(), 0);
}

#[test]
fn test_directory_as_archive_is_not_found() {
    let h = Harness::new();
    let err = h.loader.load(h.dir.path()).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::ArchiveNotFound);
}

#[test]
fn test_corrupt_archive() {
    let h = Harness::new();
    let archive = h.dir.path().join("corrupt.zip");
    std::fs::write(&archive, b"PK\x03\x04 this is not really a zip").unwrap();

    let err = h.loader.load(&archive).expect_err("should fail");

    assert_eq!(err.kind(), ErrorKind::ArchiveCorrupt);
    assert_eq!(h.workspace_count(), 0);
}

#[cfg(target_os = "linux")]
#[test]
fn test_unreadable_archive_is_corrupt() {
    let h = Harness::new();
    // A regular file whose reads fail with EIO
    let err = h
        .loader
        .load(std::path::Path::new("/proc/self/mem"))
        .expect_err("should fail");

    assert_eq!(err.kind(), ErrorKind::ArchiveCorrupt);
    assert_eq!(h.workspace_count(), 0);
}

#[test]
fn test_zero_version_is_corrupt() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "zero.zip",
        &[
            (
                "manifest.json",
                br#"{"version": 0, "summaryRoot": "sum", "patchesRoot": "patch"}"#,
            ),
            ("patch/diff.patch", b"x"),
            ("sum/summary.md", b"s"),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::ManifestCorrupt);
}

#[test]
fn test_absent_version_is_corrupt() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "absent.zip",
        &[
            ("manifest.json", br#"{"summaryRoot": "sum", "patchesRoot": "patch"}"#),
            ("patch/diff.patch", b"x"),
            ("sum/summary.md", b"s"),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::ManifestCorrupt);
}

#[test]
fn test_unparseable_manifest_is_corrupt() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "garbled.zip",
        &[
            ("manifest.json", b"{\"version\": 1.0, \"summaryRoot\": "),
            ("patch/diff.patch", b"x"),
            ("sum/summary.md", b"s"),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::ManifestCorrupt);
}

#[test]
fn test_patches_root_missing_is_invalid_manifest() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "noroot.zip",
        &[("manifest.json", MANIFEST_V1), ("sum/summary.md", b"s")],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::InvalidManifest);
}

#[test]
fn test_escaping_root_is_invalid_manifest() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "escape.zip",
        &[
            (
                "manifest.json",
                br#"{"version": 1.0, "summaryRoot": "../..", "patchesRoot": "patch"}"#,
            ),
            ("patch/diff.patch", b"x"),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::InvalidManifest);
}

#[test]
fn test_legacy_patch_missing() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "nopatch.zip",
        &[
            ("manifest.json", MANIFEST_V1),
            ("patch/", b""),
            ("patch/other.patch", b"x"),
            ("sum/summary.md", b"s"),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    match err {
        BundleError::PatchNotFound(name) => assert_eq!(name, "diff.patch"),
        other => panic!("expected PatchNotFound, got {:?}", other),
    }
}

#[test]
fn test_malformed_description_is_corrupt() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "baddesc.zip",
        &[
            ("manifest.json", MANIFEST_V1),
            ("patch/diff.patch", b"x"),
            ("patch/desc.json", b"{\"content\": [ {\"filename\": "),
            ("sum/summary.md", b"s"),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::DescriptionCorrupt);
}

#[test]
fn test_summary_missing() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "nosummary.zip",
        &[
            ("manifest.json", MANIFEST_V1),
            ("patch/diff.patch", b"x"),
            ("sum/", b""),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::SummaryNotFound);
}

#[test]
fn test_summary_is_directory() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "summarydir.zip",
        &[
            ("manifest.json", MANIFEST_V1),
            ("patch/diff.patch", b"x"),
            ("sum/summary.md/", b""),
            ("sum/summary.md/inner.txt", b"nested"),
        ],
    );

    let err = h.loader.load(&archive).expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::SummaryInvalid);
}

// ============================================================================
// Versions and warnings
// ============================================================================

#[test]
fn test_newer_version_loads_with_warning() {
    let h = Harness::new();
    let archive = h.dir.path().join("future.zip");
    let mut writer = BundleWriter::new()
        .with_version(MAX_SUPPORTED_VERSION + 1.5)
        .with_summary("from the future");
    writer.add_legacy_patch(b"x".to_vec());
    writer.write(&archive).unwrap();

    let bundle = h.loader.load(&archive).expect("newer version still loads");

    assert_eq!(bundle.summary().text(), "from the future");
    assert_eq!(
        bundle.warnings(),
        &[LoadWarning::UnsupportedVersion {
            found: MAX_SUPPORTED_VERSION + 1.5,
            supported: MAX_SUPPORTED_VERSION,
        }]
    );
}

#[test]
fn test_supported_version_has_no_warning() {
    let h = Harness::new();
    let archive = h.dir.path().join("current.zip");
    let mut writer = BundleWriter::new().with_version(0.5).with_summary("old");
    writer.add_legacy_patch(b"x".to_vec());
    writer.write(&archive).unwrap();

    let bundle = h.loader.load(&archive).expect("load");
    assert!(!bundle.has_warnings());
}

#[test]
fn test_nested_manifest_is_found() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "nested.zip",
        &[
            ("result/output/manifest.json", MANIFEST_V1),
            ("patch/diff.patch", b"x"),
            ("sum/summary.md", b"nested manifest"),
        ],
    );

    let bundle = h.loader.load(&archive).expect("load");
    assert_eq!(bundle.summary().text(), "nested manifest");
    assert!(bundle.warnings().is_empty());
}

#[test]
fn test_multiple_manifests_prefer_shallowest() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "twomanifests.zip",
        &[
            (
                "deep/er/manifest.json",
                br#"{"version": 1.0, "summaryRoot": "nowhere", "patchesRoot": "nowhere"}"#,
            ),
            ("manifest.json", MANIFEST_V1),
            ("patch/diff.patch", b"x"),
            ("sum/summary.md", b"s"),
        ],
    );

    let bundle = h.loader.load(&archive).expect("load");

    match &bundle.warnings()[0] {
        LoadWarning::AmbiguousManifest { chosen, candidates } => {
            assert_eq!(chosen.file_name().unwrap(), "manifest.json");
            assert_eq!(chosen.parent().unwrap(), bundle.extraction_root());
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected AmbiguousManifest, got {:?}", other),
    }
}

#[test]
fn test_manifest_beside_patches_is_not_a_description() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "flat.zip",
        &[
            (
                "manifest.json",
                br#"{"version": 1.0, "summaryRoot": ".", "patchesRoot": "."}"#,
            ),
            ("diff.patch", b"flat"),
            ("summary.md", b"flat layout"),
        ],
    );

    let bundle = h.loader.load(&archive).expect("load");
    assert!(bundle.is_legacy());
    assert_eq!(bundle.patches()[0].contents, b"flat");
}

#[test]
fn test_description_extension_is_case_sensitive() {
    let h = Harness::new();
    let archive = h.raw_archive(
        "upper.zip",
        &[
            ("manifest.json", MANIFEST_V1),
            ("patch/diff.patch", b"legacy"),
            ("patch/NOTES.JSON", b"not a description"),
            ("sum/summary.md", b"ok"),
        ],
    );

    let bundle = h.loader.load(&archive).expect("load");
    assert!(bundle.is_legacy());
    assert!(!bundle.has_warnings());
    assert_eq!(bundle.patches()[0].contents, b"legacy");
}

// ============================================================================
// Multi-patch content
// ============================================================================

#[test]
fn test_described_patches_keep_metadata_and_checksums() {
    let h = Harness::new();
    let archive = h.dir.path().join("multi.zip");
    let mut writer = BundleWriter::new()
        .with_roots("summary", "patches")
        .with_summary("# Upgrade\n\nThree steps.");
    writer.add_patch(
        PatchInfo::new("01-deps.patch")
            .with_name("Update dependencies")
            .with_success(true),
        b"deps".to_vec(),
    );
    writer.add_patch(
        PatchInfo::new("02-api.patch")
            .with_name("Migrate APIs")
            .with_success(true)
            .with_extra("filesChanged", json!(12)),
        b"api".to_vec(),
    );
    writer.add_patch(
        PatchInfo::new("03-tests.patch").with_success(false),
        b"tests".to_vec(),
    );
    writer.write(&archive).unwrap();

    let bundle = h.loader.load(&archive).expect("load");
    let description = bundle.description().expect("description");

    assert_eq!(bundle.patches().len(), 3);
    assert_eq!(description.len(), 3);
    for (patch, info) in bundle.patches().iter().zip(&description.content) {
        assert_eq!(patch.filename, info.filename);
        assert_eq!(patch.sha256, ct_bundle::compute_checksum(&patch.contents));
    }
    assert_eq!(description.content[1].extra["filesChanged"], 12);
    assert_eq!(description.content[2].is_successful, Some(false));
    assert_eq!(bundle.summary().text(), "# Upgrade\n\nThree steps.");
}

#[test]
fn test_patches_outlive_extracted_files() {
    let h = Harness::new();
    let archive = h.dir.path().join("mem.zip");
    let mut writer = BundleWriter::new().with_summary("s");
    writer.add_legacy_patch(b"in memory".to_vec());
    writer.write(&archive).unwrap();

    let bundle = h.loader.load(&archive).expect("load");
    std::fs::remove_dir_all(bundle.extraction_root()).unwrap();

    assert_eq!(bundle.patches()[0].as_str(), Some("in memory"));
    assert_eq!(bundle.summary().text(), "s");
}

#[test]
fn test_cloned_patch_path_ends_with_bundle() {
    let h = Harness::new();
    let archive = h.dir.path().join("clone.zip");
    let mut writer = BundleWriter::new().with_summary("s");
    writer.add_legacy_patch(b"kept".to_vec());
    writer.write(&archive).unwrap();

    let bundle = h.loader.load(&archive).expect("load");
    let patch = bundle.patches()[0].clone();
    assert!(patch.path.is_file());

    drop(bundle);
    assert!(!patch.path.exists());
    assert_eq!(patch.contents, b"kept");
}

#[test]
fn test_failed_loads_leave_no_workspace() {
    let h = Harness::new();
    let broken = h.dir.path().join("broken.zip");
    write_raw_zip(&broken, &[("manifest.json", MANIFEST_V1)]);

    for _ in 0..3 {
        assert!(h.loader.load(&broken).is_err());
    }
    assert_eq!(h.workspace_count(), 0);
}

#[test]
fn test_default_load_function() {
    let h = Harness::new();
    let archive = h.dir.path().join("default.zip");
    let mut writer = BundleWriter::new().with_summary("default loader");
    writer.add_legacy_patch(b"x".to_vec());
    writer.write(&archive).unwrap();

    let bundle = ct_bundle::load(&archive).expect("load");
    let root = bundle.extraction_root().to_path_buf();
    assert!(root.starts_with(std::env::temp_dir()));

    drop(bundle);
    assert!(!root.exists());
}
