//! Loader for code-transformation result bundles.
//!
//! A remote transformation service returns its result as a ZIP archive. This
//! crate expands such an archive, validates its structure and version, and
//! returns an immutable [`Bundle`] that downstream code (patch application, UI)
//! can use without re-validating.
//!
//! # Archive Format
//!
//! - `manifest.json` (anywhere in the tree): `version`, `summaryRoot`, `patchesRoot`
//! - `<patchesRoot>/diff.patch`: the single patch of the legacy layout, or
//! - `<patchesRoot>/*.patch` plus one `*.json` description listing them in order
//! - `<summaryRoot>/summary.md`: Markdown summary
//!
//! A manifest newer than [`MAX_SUPPORTED_VERSION`] still loads; the bundle then
//! carries a [`LoadWarning::UnsupportedVersion`].
//!
//! # Example
//!
//! ```no_run
//! use ct_bundle::{BundleLoader, LoaderConfig};
//! use std::path::Path;
//!
//! let loader = BundleLoader::new(LoaderConfig::default()).unwrap();
//! let bundle = loader.load(Path::new("result.zip")).unwrap();
//!
//! for patch in bundle.patches() {
//!     println!("{} ({} bytes)", patch.filename, patch.len());
//! }
//! println!("{}", bundle.summary().text());
//! for warning in bundle.warnings() {
//!     eprintln!("warning: {warning}");
//! }
//! ```

pub mod bundle;
pub mod cache;
pub mod config;
pub mod description;
pub mod error;
pub mod extract;
pub mod loader;
pub mod manifest;
pub mod summary;
pub mod workspace;
pub mod writer;

pub use bundle::{compute_checksum, Bundle, LoadWarning, PatchFile, PatchSet, LEGACY_PATCH_FILE_NAME};
pub use cache::BundleCache;
pub use config::{ExtractLimits, LoaderConfig};
pub use description::{DescriptionContent, PatchInfo};
pub use error::{BundleError, ErrorKind, Result};
pub use extract::{expand, ExtractStats};
pub use loader::{load, BundleLoader};
pub use manifest::{Manifest, MANIFEST_FILE_NAME, MAX_SUPPORTED_VERSION};
pub use summary::{Summary, SUMMARY_FILE_NAME};
pub use workspace::Workspace;
pub use writer::BundleWriter;
