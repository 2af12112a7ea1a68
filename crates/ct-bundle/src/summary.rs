//! Transformation summary document.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

use crate::{BundleError, Result};

/// Summary file name under the manifest's summary root.
pub const SUMMARY_FILE_NAME: &str = "summary.md";

/// Free-text (Markdown) summary, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub content: String,
}

impl Summary {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    /// Load the summary from `path`.
    ///
    /// A missing file is `SummaryNotFound`; a directory or non-UTF-8 content is
    /// `SummaryInvalid`.
    pub fn read(path: &Path) -> Result<Self> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BundleError::SummaryNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(BundleError::SummaryInvalid {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => BundleError::SummaryInvalid {
                path: path.to_path_buf(),
                reason: "content is not valid UTF-8".to_string(),
            },
            _ => BundleError::Io(e),
        })?;

        Ok(Self { content })
    }
}
