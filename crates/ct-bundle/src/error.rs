//! Error types for bundle loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or writing a result bundle.
///
/// Every variant is terminal for a `load` call: there is no partial bundle.
#[derive(Error, Debug)]
pub enum BundleError {
    /// The archive path does not exist or is not a file.
    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    /// The archive could not be expanded.
    #[error("corrupt archive '{}': {reason}", .path.display())]
    ArchiveCorrupt { path: PathBuf, reason: String },

    /// No manifest file was located after expansion.
    #[error("manifest not found in archive '{}'", .0.display())]
    ManifestNotFound(PathBuf),

    /// The manifest is undeserializable or its version is unset.
    #[error("corrupt manifest: {0}")]
    ManifestCorrupt(String),

    /// A root referenced by the manifest is unusable.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// The patch description is present but undeserializable.
    #[error("corrupt patch description '{}': {reason}", .path.display())]
    DescriptionCorrupt { path: PathBuf, reason: String },

    /// A required patch file is absent.
    #[error("patch not found: {0}")]
    PatchNotFound(String),

    /// The summary file is missing.
    #[error("summary not found: {}", .0.display())]
    SummaryNotFound(PathBuf),

    /// The summary path is not a readable text file.
    #[error("invalid summary '{}': {reason}", .path.display())]
    SummaryInvalid { path: PathBuf, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ZIP archive error (writer side)
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Bundle writer has nothing to write
    #[error("bundle has no content to write")]
    EmptyBundle,

    /// Loader configuration rejected
    #[error("invalid loader configuration: {0}")]
    InvalidConfig(String),
}

/// Stable, comparable classification of a [`BundleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ArchiveNotFound,
    ArchiveCorrupt,
    ManifestNotFound,
    ManifestCorrupt,
    InvalidManifest,
    DescriptionCorrupt,
    PatchNotFound,
    SummaryNotFound,
    SummaryInvalid,
    Io,
    Serialization,
    EmptyBundle,
    InvalidConfig,
}

impl ErrorKind {
    /// Stable machine-readable code for hosts that surface errors to agents.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ArchiveNotFound => "archive_not_found",
            ErrorKind::ArchiveCorrupt => "archive_corrupt",
            ErrorKind::ManifestNotFound => "manifest_not_found",
            ErrorKind::ManifestCorrupt => "manifest_corrupt",
            ErrorKind::InvalidManifest => "invalid_manifest",
            ErrorKind::DescriptionCorrupt => "description_corrupt",
            ErrorKind::PatchNotFound => "patch_not_found",
            ErrorKind::SummaryNotFound => "summary_not_found",
            ErrorKind::SummaryInvalid => "summary_invalid",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
            ErrorKind::EmptyBundle => "empty_bundle",
            ErrorKind::InvalidConfig => "invalid_config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl BundleError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BundleError::ArchiveNotFound(_) => ErrorKind::ArchiveNotFound,
            BundleError::ArchiveCorrupt { .. } => ErrorKind::ArchiveCorrupt,
            BundleError::ManifestNotFound(_) => ErrorKind::ManifestNotFound,
            BundleError::ManifestCorrupt(_) => ErrorKind::ManifestCorrupt,
            BundleError::InvalidManifest(_) => ErrorKind::InvalidManifest,
            BundleError::DescriptionCorrupt { .. } => ErrorKind::DescriptionCorrupt,
            BundleError::PatchNotFound(_) => ErrorKind::PatchNotFound,
            BundleError::SummaryNotFound(_) => ErrorKind::SummaryNotFound,
            BundleError::SummaryInvalid { .. } => ErrorKind::SummaryInvalid,
            BundleError::Io(_) => ErrorKind::Io,
            BundleError::Json(_) | BundleError::Zip(_) => ErrorKind::Serialization,
            BundleError::EmptyBundle => ErrorKind::EmptyBundle,
            BundleError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    pub(crate) fn archive_corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        BundleError::ArchiveCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;
